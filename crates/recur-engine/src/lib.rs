pub mod colours;
pub mod edits;
pub mod error;
pub mod fonts;
pub mod format;
pub mod handlers;
pub mod instruction;
pub mod property;
pub mod session;
pub mod transformer;

pub use colours::{ColourEntry, ColourLinks, ColourSet};
pub use edits::{ColorEdit, CompiledEdits, EffectEdit, ImageEdit, NodeEdits, OffsetEdit, PaintEdit};
pub use error::{ApplyError, CompileWarning, EngineError, InstructionError, ModelError};
pub use fonts::{FontCache, FontLoader};
pub use format::format_snapshot;
pub use instruction::{CompiledInstruction, PropertyInstruction, RawBound};
pub use property::{ModelKind, ModelSnapshot, NodeModel, PropValue, PropertyKey};
pub use session::{PluginMessage, Session, UiMessage};
pub use transformer::{ApplyFailure, ApplyReport, SelectionTransformer};
