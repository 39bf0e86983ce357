use crate::dispatcher::MessageDispatcher;
use crate::models::chat::ConversationId;
use crate::session::Session;
use crate::ui::command::{ Command, HELP };
use crate::ui::render::{ render_conversation_list, TranscriptRenderer };
use log::debug;
use std::error::Error;
use tokio::io::{ AsyncBufReadExt, BufReader };

pub async fn run_repl(dispatcher: MessageDispatcher) -> Result<(), Box<dyn Error + Send + Sync>> {
    let session = dispatcher.session().clone();
    let mut snapshots = session.subscribe();

    let renderer = tokio::spawn(async move {
        let mut transcript = TranscriptRenderer::default();
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            for line in transcript.render(&snapshot) {
                println!("{}", line);
            }
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Send(text) => {
                let outcome = dispatcher.send(&text, None).await;
                debug!("Send finished: {:?}", outcome);
            }
            Command::New => {
                session.create_conversation();
            }
            Command::List => {
                for entry in render_conversation_list(&session.snapshot()) {
                    println!("{}", entry);
                }
            }
            Command::Select(n) => with_position(&session, n, |id| session.select_conversation(id)),
            Command::Rename(n, name) => with_position(&session, n, |id| session.rename_conversation(id, name)),
            Command::Delete(n) => with_position(&session, n, |id| session.delete_conversation(id)),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Invalid(message) => println!("{}", message),
        }
    }

    renderer.abort();
    Ok(())
}

fn with_position(
    session: &Session,
    position: usize,
    apply: impl FnOnce(ConversationId) -> bool
) {
    match session.read(|state| state.store().id_at(position)) {
        Some(id) => {
            apply(id);
        }
        None => println!("There is no conversation {}. Type /list to see them.", position),
    }
}
