//! Editing of Terraform plan files.
//!
//! A plan mixes two encodings: the protobuf `tfplan` message and the
//! msgpack-encoded dynamic values embedded in it. Editing happens in two
//! stages. First the plan is edited as JSON with every dynamic value cleared
//! (the skeleton, see [`split::split_skeleton`]), then each dynamic value is
//! edited on its own through [`codec::ValueCodec`]. [`combine::combine`]
//! puts the results back together.

pub mod archive;
pub mod codec;
pub mod combine;
pub mod editor;
pub mod plan;
pub mod session;
pub mod split;
pub mod store;
