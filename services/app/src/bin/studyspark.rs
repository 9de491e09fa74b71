//! services/app/src/bin/studyspark.rs
//!
//! Thin terminal frontend: wires the configuration, adapters, state store,
//! gateway, and onboarding flow together. All the interesting behavior lives
//! in `studyspark_core`; this binary only reads lines and prints results.

use app_lib::{
    adapters::{
        EmailJsAdapter, FileStorage, GeminiVisualAdapter, OpenAiContentAdapter, OpenAiTutorAdapter,
    },
    config::Config,
    error::AppError,
};
use async_openai::{config::OpenAIConfig, Client};
use rand::Rng;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;
use studyspark_core::{
    domain::{new_entity_id, now_iso, Difficulty, FlashcardSet, QuizData, StudyGuide},
    gateway::DEFAULT_FLASHCARD_COUNT,
    onboarding::{OnboardingStep, PRESET_AVATARS},
    AppStore, ChatMessage, ContentGateway, Feature, OnboardingFlow, VerifyOutcome,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting StudySpark...");

    // --- 2. Open Local Storage & Load State ---
    let storage = Arc::new(FileStorage::new(&config.data_dir)?);
    let mut store = AppStore::load(storage);

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.openai_api_key.clone().unwrap_or_default());
    let openai_client = Client::with_config(openai_config);

    let tutor_adapter = Arc::new(OpenAiTutorAdapter::new(
        openai_client.clone(),
        config.tutor_model.clone(),
    ));
    let content_adapter = Arc::new(OpenAiContentAdapter::new(
        openai_client,
        config.content_model.clone(),
    ));
    let http = reqwest::Client::new();
    let visual_adapter = Arc::new(GeminiVisualAdapter::new(
        http.clone(),
        config.gemini_api_key.clone().unwrap_or_default(),
        config.visual_model.clone(),
    ));
    let gateway = ContentGateway::new(tutor_adapter, content_adapter, visual_adapter);

    // --- 4. Onboard When No Stored Profile Exists ---
    if store.user().is_none() {
        let email_adapter = Arc::new(EmailJsAdapter::new(http, config.emailjs.clone()));
        let flow = OnboardingFlow::new(
            email_adapter,
            Box::new(|| rand::thread_rng().gen_range(100_000..1_000_000).to_string()),
            config.debug_bypass_code,
        );
        let user = run_onboarding(flow).await?;
        store.login(user)?;
    }

    if let Some(user) = store.user() {
        println!("\nWelcome back, {}!", user.name);
    }

    // --- 5. Main Menu Loop ---
    loop {
        println!(
            "\n[1] Explain homework  [2] Study guide  [3] Flashcards  [4] Quiz\n\
             [5] Chat history  [6] Clear chat  [7] Export  [8] Import  [9] Logout  [q] Quit"
        );
        match read_line("> ")?.as_str() {
            "1" => explain_homework(&mut store, &gateway).await?,
            "2" => generate_guide(&mut store, &gateway).await?,
            "3" => generate_flashcards(&mut store, &gateway).await?,
            "4" => run_quiz(&mut store, &gateway).await?,
            "5" => {
                for message in store.chat() {
                    println!("{:?}: {}", message.role, message.text);
                }
            }
            "6" => store.clear_chat()?,
            "7" => {
                let (filename, json) = store.export_json()?;
                std::fs::write(&filename, json)?;
                println!("Saved backup to {filename}");
            }
            "8" => {
                let path = read_line("Backup file path: ")?;
                match std::fs::read_to_string(&path) {
                    Ok(json) => match store.import_json(&json) {
                        Ok(()) => println!("Study data restored successfully!"),
                        Err(e) => println!("Invalid backup file: {e}"),
                    },
                    Err(e) => println!("Could not read {path}: {e}"),
                }
            }
            "9" => {
                store.logout()?;
                println!("Logged out. Your study material stays on this machine.");
                break;
            }
            "q" => break,
            other => println!("Unknown choice: {other}"),
        }
    }

    Ok(())
}

//=========================================================================================
// Onboarding
//=========================================================================================

/// Drives the Identity -> Email -> Verify -> Success flow on the terminal and
/// returns the finished profile.
async fn run_onboarding(mut flow: OnboardingFlow) -> Result<studyspark_core::User, AppError> {
    println!("Welcome to StudySpark! Let's set up your profile.");

    loop {
        match flow.step() {
            OnboardingStep::Identity => {
                let name = read_line("Full name: ")?;
                flow.set_name(&name);
                println!("Pick an avatar [1-5], or press Enter for the default:");
                for (i, preset) in PRESET_AVATARS.iter().enumerate() {
                    println!("  [{}] {}", i + 1, preset);
                }
                let choice = read_line("> ")?;
                if let Ok(index) = choice.parse::<usize>() {
                    if (1..=PRESET_AVATARS.len()).contains(&index) {
                        flow.set_avatar(Some(PRESET_AVATARS[index - 1].to_string()));
                    }
                }
                if let Err(e) = flow.submit_identity() {
                    println!("{e}");
                }
            }
            OnboardingStep::Email => {
                let email = read_line("Academic email: ")?;
                flow.set_email(&email);
                match flow.submit_email(Instant::now()).await {
                    Ok(()) => {
                        println!("Check {} for your 6-digit access code.", flow.email())
                    }
                    Err(e) => println!("{e}"),
                }
            }
            OnboardingStep::Verify => {
                let remaining = flow.resend_remaining(Instant::now());
                if remaining > 0 {
                    println!("Enter your code ([e] edit email; resend in {remaining}s):");
                } else {
                    println!("Enter your code ([r] resend, [e] edit email):");
                }
                let line = read_line("> ")?;
                match line.as_str() {
                    "r" => match flow.resend(Instant::now()).await {
                        Ok(()) => println!("A new code is on its way."),
                        Err(e) => println!("{e}"),
                    },
                    "e" => {
                        flow.back_to_email().ok();
                    }
                    code => {
                        let mut outcome = VerifyOutcome::Incomplete;
                        for c in code.chars() {
                            outcome = flow.enter_digit(c);
                        }
                        if outcome == VerifyOutcome::Mismatch {
                            if let Some(error) = flow.inline_error() {
                                println!("{error}");
                            }
                        }
                    }
                }
            }
            OnboardingStep::Success => {
                println!("Security verified! Welcome aboard.");
                return flow.finish().map_err(|e| AppError::Internal(e.to_string()));
            }
        }
    }
}

//=========================================================================================
// Generation Actions
//=========================================================================================

async fn explain_homework(store: &mut AppStore, gateway: &ContentGateway) -> Result<(), AppError> {
    let question = read_line("What are you stuck on? ")?;
    if question.is_empty() {
        return Ok(());
    }
    store.push_chat_message(ChatMessage::user(question.clone(), None))?;

    let token = store.requests().begin(Feature::Explain);
    let answer = gateway.explain(&question, None).await;
    if store.requests().is_current(&token) {
        println!("\n{answer}");
        store.push_chat_message(ChatMessage::model(answer))?;
    }
    Ok(())
}

async fn generate_guide(store: &mut AppStore, gateway: &ContentGateway) -> Result<(), AppError> {
    let topic = read_line("Study guide topic: ")?;
    if topic.is_empty() {
        return Ok(());
    }

    let guide_token = store.requests().begin(Feature::Guide);
    let content = gateway.study_guide(&topic).await;
    let visual_token = store.requests().begin(Feature::Visual);
    let visual_url = gateway.visual(&topic).await;
    if !store.requests().is_current(&guide_token) {
        return Ok(());
    }
    // A superseded visual just means the guide ships without an image.
    let visual_url = visual_url.filter(|_| store.requests().is_current(&visual_token));

    println!("\n{content}");
    let guide = StudyGuide {
        id: new_entity_id(),
        topic,
        content,
        date_created: now_iso(),
        visual_url,
    };
    store.save_guide(guide)?;
    println!("Saved. You now have {} guide(s).", store.guides().len());
    Ok(())
}

async fn generate_flashcards(
    store: &mut AppStore,
    gateway: &ContentGateway,
) -> Result<(), AppError> {
    let topic = read_line("Flashcard topic: ")?;
    if topic.is_empty() {
        return Ok(());
    }

    let token = store.requests().begin(Feature::Flashcards);
    let cards = gateway.flashcards(&topic, DEFAULT_FLASHCARD_COUNT).await;
    if !store.requests().is_current(&token) {
        return Ok(());
    }
    if cards.is_empty() {
        println!("Couldn't generate flashcards right now. Try again in a moment.");
        return Ok(());
    }

    for card in &cards {
        println!("  {} -> {}", card.front, card.back);
    }
    let set = FlashcardSet {
        id: new_entity_id(),
        topic,
        cards,
        date_created: now_iso(),
    };
    store.save_flashcards(set)?;
    Ok(())
}

async fn run_quiz(store: &mut AppStore, gateway: &ContentGateway) -> Result<(), AppError> {
    let topic = read_line("Quiz topic: ")?;
    if topic.is_empty() {
        return Ok(());
    }
    let difficulty = match read_line("Difficulty [easy/medium/hard]: ")?.as_str() {
        "easy" => Difficulty::Easy,
        "hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    };

    let token = store.requests().begin(Feature::Quiz);
    let questions = gateway.quiz(&topic, difficulty).await;
    if !store.requests().is_current(&token) {
        return Ok(());
    }
    if questions.is_empty() {
        println!("Couldn't generate a quiz right now. Try again in a moment.");
        return Ok(());
    }

    let mut score = 0;
    for (i, q) in questions.iter().enumerate() {
        println!("\nQ{}: {}", i + 1, q.question);
        for (j, option) in q.options.iter().enumerate() {
            println!("  [{}] {}", j + 1, option);
        }
        let answer = read_line("Answer: ")?.parse::<usize>().unwrap_or(0);
        if answer == q.correct_answer_index + 1 {
            score += 1;
            println!("Correct!");
        } else {
            println!(
                "Not quite. The answer was [{}]. {}",
                q.correct_answer_index + 1,
                q.explanation
            );
        }
    }
    println!("\nScore: {score}/{}", questions.len());

    if read_line("Save this quiz? [y/N] ")? == "y" {
        let quiz = QuizData {
            id: new_entity_id(),
            topic,
            questions,
            date_created: now_iso(),
        };
        store.save_quiz(quiz)?;
    }
    Ok(())
}

//=========================================================================================
// Terminal Helpers
//=========================================================================================

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
