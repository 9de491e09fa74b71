pub mod content_llm;
pub mod email;
pub mod storage;
pub mod tutor_llm;
pub mod visual;

pub use content_llm::OpenAiContentAdapter;
pub use email::EmailJsAdapter;
pub use storage::FileStorage;
pub use tutor_llm::OpenAiTutorAdapter;
pub use visual::GeminiVisualAdapter;
