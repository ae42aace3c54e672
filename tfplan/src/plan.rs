//! The `tfplan` protobuf messages (plan file format version 3).
//!
//! The messages are declared by hand with `prost` derives rather than
//! generated, so that they can also carry the `serde` attributes of the JSON
//! projection that users edit. JSON field names are the lowerCamelCase
//! protobuf JSON names, enums are written by name and `bytes` fields as
//! standard base64.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Implemented by the protobuf enums so they can be written by name.
pub trait ProtoEnum: Sized + Copy + TryFrom<i32> + Into<i32> {
    fn as_str_name(&self) -> &'static str;
    fn from_str_name(name: &str) -> Option<Self>;
}

macro_rules! proto_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal => $text:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl ProtoEnum for $name {
            fn as_str_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            fn from_str_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// The root of a plan file.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plan {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    #[prost(enumeration = "Mode", tag = "17")]
    #[serde(
        serialize_with = "enum_name::serialize::<Mode, _>",
        deserialize_with = "enum_name::deserialize::<Mode, _>"
    )]
    pub ui_mode: i32,
    #[prost(bool, tag = "20")]
    pub errored: bool,
    /// Root module input variables, each a msgpack value.
    #[prost(btree_map = "string, message", tag = "2")]
    pub variables: BTreeMap<String, DynamicValue>,
    #[prost(message, repeated, tag = "3")]
    pub resource_changes: Vec<ResourceInstanceChange>,
    /// Changes detected outside of Terraform since the last run.
    #[prost(message, repeated, tag = "18")]
    pub resource_drift: Vec<ResourceInstanceChange>,
    #[prost(message, repeated, tag = "27")]
    pub deferred_changes: Vec<DeferredResourceInstanceChange>,
    #[prost(message, repeated, tag = "4")]
    pub output_changes: Vec<OutputChange>,
    #[prost(message, repeated, tag = "19")]
    pub check_results: Vec<CheckResults>,
    #[prost(string, repeated, tag = "5")]
    pub target_addrs: Vec<String>,
    #[prost(string, repeated, tag = "16")]
    pub force_replace_addrs: Vec<String>,
    #[prost(string, tag = "14")]
    pub terraform_version: String,
    #[prost(message, optional, tag = "13")]
    pub backend: Option<Backend>,
    #[prost(message, repeated, tag = "15")]
    pub relevant_attributes: Vec<ResourceAttr>,
    #[prost(string, tag = "21")]
    pub timestamp: String,
    #[prost(bool, tag = "25")]
    pub applyable: bool,
    #[prost(bool, tag = "26")]
    pub complete: bool,
    /// Results of provider-defined function calls made while planning, which
    /// apply checks against.
    #[prost(message, repeated, tag = "22")]
    pub function_results: Vec<FunctionCallHash>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionCallHash {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "base64_bytes")]
    pub result: Vec<u8>,
}

/// A resource attribute that contributed to the plan.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceAttr {
    #[prost(string, tag = "1")]
    pub resource: String,
    #[prost(message, optional, tag = "2")]
    pub attr: Option<Path>,
}

proto_enum! {
    Mode {
        Normal = 0 => "NORMAL",
        Destroy = 1 => "DESTROY",
        RefreshOnly = 2 => "REFRESH_ONLY",
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Backend {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(message, optional, tag = "2")]
    pub config: Option<DynamicValue>,
    #[prost(string, tag = "3")]
    pub workspace: String,
}

proto_enum! {
    Action {
        Noop = 0 => "NOOP",
        Create = 1 => "CREATE",
        Read = 2 => "READ",
        Update = 3 => "UPDATE",
        Delete = 5 => "DELETE",
        DeleteThenCreate = 6 => "DELETE_THEN_CREATE",
        CreateThenDelete = 7 => "CREATE_THEN_DELETE",
        Forget = 8 => "FORGET",
    }
}

/// A change to a single value.
///
/// `values` holds one entry for create/delete actions and two (before,
/// after) for replacements and updates.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Change {
    #[prost(enumeration = "Action", tag = "1")]
    #[serde(
        serialize_with = "enum_name::serialize::<Action, _>",
        deserialize_with = "enum_name::deserialize::<Action, _>"
    )]
    pub action: i32,
    #[prost(message, repeated, tag = "2")]
    pub values: Vec<DynamicValue>,
    #[prost(message, repeated, tag = "3")]
    pub before_sensitive_paths: Vec<Path>,
    #[prost(message, repeated, tag = "4")]
    pub after_sensitive_paths: Vec<Path>,
    #[prost(message, optional, tag = "5")]
    pub importing: Option<Importing>,
    #[prost(string, tag = "6")]
    pub generated_config: String,
}

proto_enum! {
    ResourceInstanceActionReason {
        None = 0 => "NONE",
        ReplaceBecauseTainted = 1 => "REPLACE_BECAUSE_TAINTED",
        ReplaceByRequest = 2 => "REPLACE_BY_REQUEST",
        ReplaceBecauseCannotUpdate = 3 => "REPLACE_BECAUSE_CANNOT_UPDATE",
        DeleteBecauseNoResourceConfig = 4 => "DELETE_BECAUSE_NO_RESOURCE_CONFIG",
        DeleteBecauseWrongRepetition = 5 => "DELETE_BECAUSE_WRONG_REPETITION",
        DeleteBecauseCountIndex = 6 => "DELETE_BECAUSE_COUNT_INDEX",
        DeleteBecauseEachKey = 7 => "DELETE_BECAUSE_EACH_KEY",
        DeleteBecauseNoModule = 8 => "DELETE_BECAUSE_NO_MODULE",
        ReplaceByTriggers = 9 => "REPLACE_BY_TRIGGERS",
        ReadBecauseConfigUnknown = 10 => "READ_BECAUSE_CONFIG_UNKNOWN",
        ReadBecauseDependencyPending = 11 => "READ_BECAUSE_DEPENDENCY_PENDING",
        DeleteBecauseNoMoveTarget = 12 => "DELETE_BECAUSE_NO_MOVE_TARGET",
        ReadBecauseCheckNested = 13 => "READ_BECAUSE_CHECK_NESTED",
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceInstanceChange {
    #[prost(string, tag = "13")]
    pub addr: String,
    #[prost(string, tag = "14")]
    pub prev_run_addr: String,
    #[prost(string, tag = "7")]
    pub deposed_key: String,
    #[prost(string, tag = "8")]
    pub provider: String,
    #[prost(message, optional, tag = "9")]
    pub change: Option<Change>,
    /// Opaque provider data, never interpreted.
    #[prost(bytes = "vec", tag = "10")]
    #[serde(with = "base64_bytes")]
    pub private: Vec<u8>,
    #[prost(message, repeated, tag = "11")]
    pub required_replace: Vec<Path>,
    #[prost(enumeration = "ResourceInstanceActionReason", tag = "12")]
    #[serde(
        serialize_with = "enum_name::serialize::<ResourceInstanceActionReason, _>",
        deserialize_with = "enum_name::deserialize::<ResourceInstanceActionReason, _>"
    )]
    pub action_reason: i32,
}

proto_enum! {
    DeferredReason {
        Invalid = 0 => "INVALID",
        InstanceCountUnknown = 1 => "INSTANCE_COUNT_UNKNOWN",
        ResourceConfigUnknown = 2 => "RESOURCE_CONFIG_UNKNOWN",
        ProviderConfigUnknown = 3 => "PROVIDER_CONFIG_UNKNOWN",
        AbsentPrereq = 4 => "ABSENT_PREREQ",
        DeferredPrereq = 5 => "DEFERRED_PREREQ",
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeferredResourceInstanceChange {
    #[prost(enumeration = "DeferredReason", tag = "1")]
    #[serde(
        serialize_with = "enum_name::serialize::<DeferredReason, _>",
        deserialize_with = "enum_name::deserialize::<DeferredReason, _>"
    )]
    pub deferred_reason: i32,
    #[prost(message, optional, tag = "2")]
    pub change: Option<ResourceInstanceChange>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputChange {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub change: Option<Change>,
    #[prost(bool, tag = "3")]
    pub sensitive: bool,
}

proto_enum! {
    CheckStatus {
        Unknown = 0 => "UNKNOWN",
        Pass = 1 => "PASS",
        Fail = 2 => "FAIL",
        Error = 3 => "ERROR",
    }
}

proto_enum! {
    CheckObjectKind {
        Unspecified = 0 => "UNSPECIFIED",
        Resource = 1 => "RESOURCE",
        OutputValue = 2 => "OUTPUT_VALUE",
        Check = 3 => "CHECK",
        InputVariable = 4 => "INPUT_VARIABLE",
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckResults {
    #[prost(enumeration = "CheckObjectKind", tag = "1")]
    #[serde(
        serialize_with = "enum_name::serialize::<CheckObjectKind, _>",
        deserialize_with = "enum_name::deserialize::<CheckObjectKind, _>"
    )]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub config_addr: String,
    #[prost(enumeration = "CheckStatus", tag = "3")]
    #[serde(
        serialize_with = "enum_name::serialize::<CheckStatus, _>",
        deserialize_with = "enum_name::deserialize::<CheckStatus, _>"
    )]
    pub status: i32,
    #[prost(message, repeated, tag = "4")]
    pub objects: Vec<CheckObjectResult>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckObjectResult {
    #[prost(string, tag = "1")]
    pub object_addr: String,
    #[prost(enumeration = "CheckStatus", tag = "2")]
    #[serde(
        serialize_with = "enum_name::serialize::<CheckStatus, _>",
        deserialize_with = "enum_name::deserialize::<CheckStatus, _>"
    )]
    pub status: i32,
    #[prost(string, repeated, tag = "3")]
    pub failure_messages: Vec<String>,
}

/// A msgpack-encoded value of a type that is not known to the plan itself.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicValue {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub msgpack: Vec<u8>,
}

impl DynamicValue {
    pub fn new(msgpack: Vec<u8>) -> Self {
        Self { msgpack }
    }

    /// An empty value stands for an absent one.
    pub fn is_empty(&self) -> bool {
        self.msgpack.is_empty()
    }
}

/// A path into a value, as used for sensitivity marks and replace triggers.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Path {
    #[prost(message, repeated, tag = "1")]
    pub steps: Vec<path::Step>,
}

pub mod path {
    use serde::{Deserialize, Serialize};

    /// Written the way protobuf JSON writes a oneof: the selected field sits
    /// directly in the step, as in `{"attributeName": "tags"}`.
    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    pub struct Step {
        #[prost(oneof = "Selector", tags = "1, 2")]
        #[serde(flatten)]
        pub selector: Option<Selector>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Selector {
        /// Selects an attribute of an object.
        #[prost(string, tag = "1")]
        AttributeName(String),
        /// Selects an element of a collection by its msgpack-encoded key.
        #[prost(message, tag = "2")]
        ElementKey(super::DynamicValue),
    }

    impl Step {
        pub fn attribute(name: impl Into<String>) -> Self {
            Self {
                selector: Some(Selector::AttributeName(name.into())),
            }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Importing {
    #[prost(string, tag = "1")]
    pub id: String,
}

mod enum_name {
    use super::ProtoEnum;
    use serde::{de, Deserializer, Serializer};
    use std::{fmt, marker::PhantomData};

    pub(super) fn serialize<E: ProtoEnum, S: Serializer>(
        value: &i32,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match E::try_from(*value) {
            Ok(known) => serializer.serialize_str(known.as_str_name()),
            // keep values from newer Terraform versions
            Err(_) => serializer.serialize_i32(*value),
        }
    }

    pub(super) fn deserialize<'de, E: ProtoEnum, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<i32, D::Error> {
        deserializer.deserialize_any(NameOrNumber::<E>(PhantomData))
    }

    struct NameOrNumber<E>(PhantomData<E>);

    impl<'de, E: ProtoEnum> de::Visitor<'de> for NameOrNumber<E> {
        type Value = i32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an enum value name or number")
        }

        fn visit_str<Err: de::Error>(self, name: &str) -> Result<i32, Err> {
            E::from_str_name(name)
                .map(Into::into)
                .ok_or_else(|| Err::custom(format!("unknown enum value: {}", name)))
        }

        fn visit_i64<Err: de::Error>(self, number: i64) -> Result<i32, Err> {
            i32::try_from(number)
                .map_err(|_| Err::custom(format!("enum value out of range: {}", number)))
        }

        fn visit_u64<Err: de::Error>(self, number: u64) -> Result<i32, Err> {
            i32::try_from(number)
                .map_err(|_| Err::custom(format!("enum value out of range: {}", number)))
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.trim()).map_err(de::Error::custom)
    }
}
