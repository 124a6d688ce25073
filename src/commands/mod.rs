mod clean;
mod clean_text;
mod clean_url;
mod platforms;
mod util;

pub use clean::Clean;
pub use clean_text::CleanText;
pub use clean_url::CleanUrl;
pub use platforms::Platforms;
