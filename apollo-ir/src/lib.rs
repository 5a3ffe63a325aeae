//! ## Usage
//!
//! This crate builds the intermediate representation of a GraphQL client code generator: from a
//! validated schema and executable document, it computes everything code emission needs to
//! generate typed models and their (de)serialization, without knowing anything about the target
//! language.
//!
//! Fields selected several times are merged, `@include`/`@skip` are turned into boolean
//! conditions, and polymorphic positions are split into one model per possible response shape,
//! with a fallback model for the types no fragment matched. Every model has a deterministic id
//! derived from its position, so that building the same documents twice gives identical output.
//!
//! ```
//! use apollo_ir::CodegenModels;
//! use apollo_ir::IrConfig;
//! use apollo_ir::IrOperationsBuilder;
//! use apollo_ir::SchemaIndex;
//!
//! let (schema, document) = apollo_compiler::parser::Parser::new().parse_mixed_validate(
//!     r#"
//!     type Query { node: Node }
//!     interface Node { id: ID! }
//!     type Cat implements Node { id: ID!, meow: String }
//!     type Dog implements Node { id: ID!, bark: String }
//!
//!     query Pets { node { id ... on Cat { meow } } }
//!     "#,
//!     "pets.graphql",
//! )
//! .unwrap();
//! let schema = SchemaIndex::new(schema);
//! let config = IrConfig {
//!     codegen_models: CodegenModels::ResponseBased,
//!     ..IrConfig::default()
//! };
//! let ir = IrOperationsBuilder::new(&schema, &document)
//!     .with_config(config)
//!     .build()
//!     .unwrap();
//! let node = &ir.operations[0].data_model_group.models[0].model_groups[0];
//! assert_eq!(node.models.len(), 3);
//! ```

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

mod builder;
pub mod conditions;
pub mod config;
mod display_helpers;
pub mod error;
pub mod ir;
pub mod schema;
pub(crate) mod utils;

pub use crate::builder::IrOperationsBuilder;
pub use crate::config::CodegenModels;
pub use crate::config::IrConfig;
pub use crate::error::IrError;
pub use crate::ir::IrOperations;
pub use crate::schema::SchemaIndex;
