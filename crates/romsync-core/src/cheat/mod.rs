//! Cheat codes: server model, cheat files, type registry, validation, the
//! local `cheats.txt` format and the runtime-facing buffer.

mod buffer;
mod file;
mod model;
mod service;
mod types;
mod validator;

pub use buffer::{CheatBuffer, CheatSlot};
pub use file::{parse_cheat_file, render_cheat_file};
pub use model::{CheatCode, CheatDraft, CheatFile, CheatFileUpload, RAW_CHEAT_TYPE};
pub use service::{CheatFileService, CheatService, CheatTypeSource};
pub use types::{CheatType, CheatTypeRegistry, FALLBACK_PATTERN};
pub use validator::{CheatValidator, MAX_FIELD_LEN, ValidationErrors};
