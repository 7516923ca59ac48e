pub mod mock;
pub mod taifex;
pub mod traits;

pub use mock::MockTransport;
pub use taifex::TaifexTransport;
pub use traits::{HttpResponse, Transport};
