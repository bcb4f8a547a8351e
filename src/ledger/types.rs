//! Ledger record types
//!
//! These mirror the JSON shapes returned by the node's read API. Field
//! payloads stay as raw `serde_json::Value` because the Move struct layout
//! is owned by the contract, not by us.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `dataType` of a content block holding a Move struct
pub const MOVE_OBJECT_KIND: &str = "moveObject";

/// What to include when fetching an object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectOptions {
    pub show_content: bool,
    pub show_owner: bool,
}

impl ObjectOptions {
    /// Content only, which is all reconciliation needs
    pub fn content() -> Self {
        Self {
            show_content: true,
            show_owner: false,
        }
    }
}

/// A fetched ledger object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub object_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub content: Option<ObjectContent>,
}

impl ObjectRecord {
    /// Build a Move object record from its struct type and fields
    pub fn move_object(object_id: impl Into<String>, struct_type: &str, fields: Value) -> Self {
        Self {
            object_id: object_id.into(),
            version: None,
            object_type: Some(struct_type.to_string()),
            owner: None,
            content: Some(ObjectContent {
                data_type: MOVE_OBJECT_KIND.to_string(),
                struct_type: Some(struct_type.to_string()),
                fields,
            }),
        }
    }

    /// Struct fields, if this record carries Move object content
    pub fn move_fields(&self) -> Option<&Value> {
        self.content
            .as_ref()
            .filter(|c| c.data_type == MOVE_OBJECT_KIND)
            .map(|c| &c.fields)
    }
}

/// Parsed content of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub data_type: String,
    #[serde(default, rename = "type")]
    pub struct_type: Option<String>,
    #[serde(default)]
    pub fields: Value,
}

/// Object ownership as reported by the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Owner {
    AddressOwner(String),
    ObjectOwner(String),
    Shared { initial_shared_version: Value },
    Immutable,
}

impl Owner {
    pub fn is_shared(&self) -> bool {
        matches!(self, Owner::Shared { .. })
    }
}

/// A dynamic child under a parent table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRef {
    /// Table key, exactly as the node reported it (`name.value`)
    pub key: Value,
    /// Object id of the dynamic field wrapper
    pub child_id: String,
}

impl ChildRef {
    pub fn new(key: Value, child_id: impl Into<String>) -> Self {
        Self {
            key,
            child_id: child_id.into(),
        }
    }
}

/// A pure or object argument to a Move call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Object(String),
    String(String),
}

impl CallArg {
    /// Argument as the wallet CLI expects it on the command line
    pub fn as_cli_arg(&self) -> String {
        match self {
            CallArg::Object(id) => id.clone(),
            CallArg::String(s) => s.clone(),
        }
    }
}

/// An entry-function call to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub arguments: Vec<CallArg>,
    pub type_arguments: Vec<String>,
}

impl MoveCall {
    pub fn new(package: &str, module: &str, function: &str) -> Self {
        Self {
            package: package.to_string(),
            module: module.to_string(),
            function: function.to_string(),
            arguments: Vec::new(),
            type_arguments: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: CallArg) -> Self {
        self.arguments.push(arg);
        self
    }

    /// Fully qualified target, `package::module::function`
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub digest: String,
}

/// Execution status of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Reference to an object version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub object_id: String,
    #[serde(default)]
    pub version: Value,
    #[serde(default)]
    pub digest: Option<String>,
}

/// An object written by a transaction together with its new owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedObjectRef {
    pub owner: Owner,
    pub reference: ObjectReference,
}

/// The parts of transaction effects we act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEffects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
}

impl TransactionEffects {
    /// First shared object created by the transaction
    pub fn first_shared_created(&self) -> Option<&str> {
        self.created
            .iter()
            .find(|obj| obj.owner.is_shared())
            .map(|obj| obj.reference.object_id.as_str())
    }
}
