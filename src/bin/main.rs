use budgetwise_advisor::{
    conversation::QUICK_QUESTIONS, AdvisorConfig, AdvisoryChatService, ChatMessage,
    UserFinancialContext,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: advisor [--balance N] [--income N] [--expenses N] <question...>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let (context, question) = parse_args(std::env::args().skip(1))?;

    let question = match question {
        Some(q) => q,
        None => {
            eprintln!("{}", USAGE);
            eprintln!("\nTry one of:");
            for q in QUICK_QUESTIONS {
                eprintln!("  - {}", q);
            }
            return Ok(());
        }
    };

    let service = AdvisoryChatService::from_config(AdvisorConfig::from_env());
    info!(question = %question, "Asking advisor");

    let response = service
        .send_chat_message(&[ChatMessage::user(question)], &context)
        .await;

    if let Some(diagnostic) = &response.error {
        warn!("Fallback answer: {}", diagnostic);
    }

    println!("{}", response.message);
    Ok(())
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(UserFinancialContext, Option<String>), Box<dyn std::error::Error>> {
    let mut context = UserFinancialContext::default();
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--balance" => &mut context.total_balance,
            "--income" => &mut context.monthly_income,
            "--expenses" => &mut context.monthly_expenses,
            _ => {
                words.push(arg);
                continue;
            }
        };

        let value = args
            .next()
            .ok_or_else(|| format!("{} needs a value\n{}", arg, USAGE))?;
        *slot = Some(value.parse::<f64>().map_err(|e| format!("{} {}: {}", arg, value, e))?);
    }

    let question = words.join(" ");
    let question = if question.trim().is_empty() { None } else { Some(question) };

    Ok((context, question))
}
