use clap::Subcommand;
use devflow_core::chat::{self, ChatMessage, APOLOGY};
use std::io::{BufRead, Write};

use super::{block_on, Context};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ChatSubcommand {
    /// Send a message to the project chat
    Send {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Print the project conversation
    History {
        #[arg(long)]
        project: Option<String>,
    },
    /// Chat with the memory agent (history lasts for this session only)
    Memory,
}

pub fn run(ctx: &Context, subcmd: ChatSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ChatSubcommand::Send { text, project } => send(ctx, project.as_deref(), &text.join(" ")),
        ChatSubcommand::History { project } => history(ctx, project.as_deref()),
        ChatSubcommand::Memory => memory(ctx),
    }
}

fn send(ctx: &Context, project: Option<&str>, text: &str) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("message must not be empty");
    }
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let generator = ctx.generator()?;

    let question = ChatMessage::user(text);
    let (project, _) = store.modify_project(&ctx.user, &project.id, |p| {
        chat::append(&mut p.messages, question.clone());
        Ok(true)
    })?;

    let result = block_on(devflow_ai::tools::continue_conversation(
        &generator,
        &project.messages,
        &project,
    ))?;
    let (reply, error) = match result {
        Ok(text) => (ChatMessage::ai(text), None),
        Err(e) => {
            tracing::error!(project_id = %project.id, error = %e, "chat reply failed");
            (ChatMessage::ai(APOLOGY), Some(e.user_message()))
        }
    };
    store.modify_project(&ctx.user, &project.id, |p| {
        chat::append(&mut p.messages, reply.clone());
        Ok(true)
    })?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "message": question,
            "reply": reply,
            "error": error,
        }));
    }
    println!("{}", reply.text);
    if let Some(error) = error {
        eprintln!("({error})");
    }
    Ok(())
}

fn history(ctx: &Context, project: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;

    if ctx.json {
        return print_json(&project.messages);
    }
    if project.messages.is_empty() {
        println!("No messages yet.");
    } else {
        println!("{}", chat::transcript(&project.messages));
    }
    Ok(())
}

fn memory(ctx: &Context) -> anyhow::Result<()> {
    let generator = ctx.generator()?;
    let rt = tokio::runtime::Runtime::new()?;
    let mut messages: Vec<ChatMessage> = Vec::new();

    println!("Memory agent. Empty line or Ctrl-D to quit.");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            break;
        }

        let reply = match rt.block_on(devflow_ai::tools::ask_memory_agent(
            &generator, &messages, input,
        )) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error: {}", e.user_message());
                continue;
            }
        };
        println!("{reply}");
        messages.push(ChatMessage::user(input));
        messages.push(ChatMessage::ai(reply));
    }
    Ok(())
}
