pub mod domain;
pub mod gateway;
pub mod onboarding;
pub mod ports;
pub mod store;

pub use domain::{
    BackupDocument, BackupImport, ChatMessage, ChatRole, Difficulty, Flashcard, FlashcardSet,
    Provider, QuizData, QuizQuestion, StudyGuide, User,
};
pub use gateway::ContentGateway;
pub use onboarding::{OnboardingFlow, OnboardingStep, OtpInput, VerifyOutcome};
pub use ports::{
    ContentGenerationService, EmailDeliveryService, PortError, PortResult, StorageService,
    TutorService, VisualGenerationService,
};
pub use store::{AppStore, Feature, RequestToken, RequestTracker};
