//! Visual schema designer core: field trees ⇄ Zod validators.
//!
//! - [`emit`] turns a [`field::Field`] tree into a Zod schema module.
//! - [`reflect`] turns a built [`validator::ZodType`] back into a field tree.
//! - [`loader`] parses emitted modules into validator objects, closing the loop.
//! - [`samples`] holds the canned demo collections shown by the designer.
pub mod cli;
pub mod diagnostics;
pub mod emit;
pub mod field;
pub mod loader;
pub mod path_de;
pub mod reflect;
pub mod samples;
pub mod validator;

pub use diagnostics::{Anomaly, FieldPath};
pub use emit::{emit_module, generate_zod_schema, EmitOptions, Emitted};
pub use field::{validation_summary, CalculatedField, Field, FieldType, Validations};
pub use loader::{load, LoadError, LoadedModule};
pub use reflect::{reflect, zod_to_field, Reflected};
pub use samples::{RegistryError, SampleRegistry};
pub use validator::{ZodKind, ZodType};
