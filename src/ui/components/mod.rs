mod command_input;
mod confirm;
mod input;
mod key_result;
mod option_picker;
mod search_input;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::ConfirmDialog;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use option_picker::{OptionPicker, PickerEvent};
pub use search_input::{SearchEvent, SearchInput};
pub use toast::{Toast, ToastKind, Toaster, Toasts};
