//! Main chat client orchestration.
//!
//! Coordinates the complete client lifecycle: WebSocket connect, user room
//! join, REST history load into the controller, the input/event select loop
//! with optimistic sends, slash commands, live receipts and notifications,
//! and teardown.

use std::io::Write;

use anyhow::Context;
use console::style;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rustyline_async::SharedWriter;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use worklink_core::chat::controller::{ChatController, LocalMessage};
use worklink_types::chat::Chat;
use worklink_types::realtime::{ClientEvent, ServerEvent};
use worklink_types::service::ServiceStatus;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::remote::RemoteApi;
use super::renderer::{ChatRenderer, short_id};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// The conversation currently on screen.
struct OpenChat {
    chat: Chat,
    controller: ChatController,
}

/// Run the interactive chat client against a gateway.
pub async fn run_chat_loop(
    user_id: Uuid,
    server: &str,
    initial_chat: Option<Uuid>,
) -> anyhow::Result<()> {
    let api = RemoteApi::new(server);
    let renderer = ChatRenderer::new(user_id);

    let (ws_stream, _) = connect_async(api.ws_url())
        .await
        .context("could not reach the gateway websocket")?;
    let (mut ws_write, mut ws_read) = ws_stream.split();

    // Join the personal inbox room before anything else so notifications
    // and receipts arrive from the first moment.
    send_client_event(&mut ws_write, &ClientEvent::Join { user_id }).await?;

    print_banner(server, &user_id);

    let prompt = format!("  {} ", style(">").green().bold());
    let (mut input, mut out) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("failed to initialize input: {e}"))?;

    let mut open: Option<OpenChat> = None;

    if let Some(chat_id) = initial_chat {
        match open_chat(&api, &mut ws_write, &renderer, user_id, chat_id, &mut out).await {
            Ok(opened) => {
                set_chat_prompt(&mut input, &chat_id);
                open = Some(opened);
            }
            Err(e) => writeln!(out, "  {} {e:#}", style("!").red().bold())?,
        }
    } else {
        show_chats(&api, &renderer, user_id, &mut out).await?;
    }

    loop {
        tokio::select! {
            event = input.read_line() => match event {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    writeln!(out, "  {}", style("Ctrl+D or /quit to exit.").dim())?;
                }
                InputEvent::Message(text) => {
                    if text.is_empty() {
                        continue;
                    }

                    if let Some(cmd) = commands::parse(&text) {
                        match cmd {
                            ChatCommand::Help => {
                                writeln!(out, "{}", commands::help_text())?;
                            }
                            ChatCommand::Quit => break,
                            ChatCommand::Chats => {
                                show_chats(&api, &renderer, user_id, &mut out).await?;
                            }
                            ChatCommand::Open(raw) => match raw.parse::<Uuid>() {
                                Ok(chat_id) => {
                                    if let Some(previous) = open.take() {
                                        send_client_event(
                                            &mut ws_write,
                                            &ClientEvent::LeaveChat { chat_id: previous.chat.id },
                                        )
                                        .await?;
                                    }
                                    match open_chat(
                                        &api, &mut ws_write, &renderer, user_id, chat_id, &mut out,
                                    )
                                    .await
                                    {
                                        Ok(opened) => {
                                            set_chat_prompt(&mut input, &chat_id);
                                            open = Some(opened);
                                        }
                                        Err(e) => {
                                            writeln!(out, "  {} {e:#}", style("!").red().bold())?;
                                        }
                                    }
                                }
                                Err(_) => {
                                    writeln!(
                                        out,
                                        "  {} Not a valid chat id: {raw}",
                                        style("!").yellow().bold()
                                    )?;
                                }
                            },
                            ChatCommand::Status(raw) => {
                                relay_status(&mut ws_write, open.as_ref(), user_id, &raw, &mut out)
                                    .await?;
                            }
                            ChatCommand::Unknown(cmd_name) => {
                                writeln!(
                                    out,
                                    "  {} Unknown command: {}. Type /help for available commands.",
                                    style("?").yellow().bold(),
                                    style(cmd_name).dim()
                                )?;
                            }
                        }
                        continue;
                    }

                    // Plain text is an optimistic send into the open chat.
                    let Some(current) = open.as_mut() else {
                        writeln!(
                            out,
                            "  {} No chat open. /chats to list, /open <id> to start.",
                            style("!").yellow().bold()
                        )?;
                        continue;
                    };

                    let correlation = current.controller.begin_send(text.clone());
                    if let Some(entry) = current.controller.messages().last() {
                        writeln!(out, "{}", renderer.message_line(entry))?;
                    }

                    match api.send_message(&current.chat.id, &user_id, &text).await {
                        Ok(message) => current.controller.complete_send(correlation, message),
                        Err(e) => {
                            current.controller.fail_send(correlation);
                            writeln!(out, "  {} send failed: {e:#}", style("!").red().bold())?;
                        }
                    }
                }
            },

            frame = ws_read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => {
                            handle_server_event(event, &mut open, &renderer, &mut ws_write, &mut out)
                                .await?;
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "Ignoring unrecognized server frame");
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    writeln!(out, "  {}", style("Connection closed by server.").dim())?;
                    break;
                }
                Some(Err(e)) => {
                    writeln!(out, "  {} connection error: {e}", style("!").red().bold())?;
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = ws_write.close().await;
    println!("\n  {}", style("Disconnected.").dim());
    Ok(())
}

/// Apply one server event to the client view.
async fn handle_server_event(
    event: ServerEvent,
    open: &mut Option<OpenChat>,
    renderer: &ChatRenderer,
    ws_write: &mut WsSink,
    out: &mut SharedWriter,
) -> anyhow::Result<()> {
    match event {
        ServerEvent::NewMessage { message } => {
            if let Some(current) = open.as_mut()
                && current.controller.apply_incoming(message.clone())
            {
                // The echo of an own optimistic send is already on screen.
                if message.sender_id != current.controller.user_id() {
                    writeln!(
                        out,
                        "{}",
                        renderer.message_line(&LocalMessage::Confirmed(message))
                    )?;
                }
                mark_unread(current, ws_write).await?;
            }
        }
        ServerEvent::Notification {
            kind,
            chat_id,
            sender_id,
            content,
            timestamp: _,
        } => {
            // The open chat's messages arrive in full through the chat room;
            // only background chats surface as inbox lines.
            let on_screen = open.as_ref().is_some_and(|o| o.chat.id == chat_id);
            if !on_screen {
                writeln!(
                    out,
                    "{}",
                    renderer.notification_line(kind, &chat_id, &sender_id, &content)
                )?;
            }
        }
        ServerEvent::ServiceNotification {
            kind: _,
            service_id,
            status,
            timestamp: _,
        } => {
            writeln!(out, "{}", renderer.service_line(&service_id, status))?;
        }
        ServerEvent::MessageRead {
            chat_id,
            message_id,
            read_at,
        } => {
            if let Some(current) = open.as_mut()
                && current.chat.id == chat_id
                && current.controller.apply_read(message_id, read_at)
            {
                writeln!(out, "{}", renderer.receipt_line())?;
            }
        }
        ServerEvent::Error { message } => {
            writeln!(out, "  {} {message}", style("!").red().bold())?;
        }
    }
    Ok(())
}

/// Fetch a chat plus its history, join its room, and render the backlog.
async fn open_chat(
    api: &RemoteApi,
    ws_write: &mut WsSink,
    renderer: &ChatRenderer,
    user_id: Uuid,
    chat_id: Uuid,
    out: &mut SharedWriter,
) -> anyhow::Result<OpenChat> {
    let chat = api.get_chat(&chat_id).await?;
    let history = api.history(&chat_id, None).await?;

    let mut controller = ChatController::new(chat_id, user_id);
    controller.load_history(history);

    send_client_event(ws_write, &ClientEvent::JoinChat { chat_id }).await?;

    writeln!(out)?;
    writeln!(
        out,
        "  {} {}",
        style("Chat").bold(),
        style(short_id(&chat_id)).cyan()
    )?;
    for entry in controller.messages() {
        writeln!(out, "{}", renderer.message_line(entry))?;
    }

    let mut opened = OpenChat { chat, controller };
    // The backlog is on screen now, so everything from others counts as read.
    mark_unread(&mut opened, ws_write).await?;
    Ok(opened)
}

/// Issue `mark_as_read` for every newly rendered message from others.
async fn mark_unread(current: &mut OpenChat, ws_write: &mut WsSink) -> anyhow::Result<()> {
    let chat_id = current.controller.chat_id();
    for message_id in current.controller.take_unread() {
        send_client_event(
            ws_write,
            &ClientEvent::MarkAsRead {
                chat_id,
                message_id,
            },
        )
        .await?;
    }
    Ok(())
}

/// Relay a `/status` command as a service update to the other participants.
async fn relay_status(
    ws_write: &mut WsSink,
    open: Option<&OpenChat>,
    user_id: Uuid,
    raw: &str,
    out: &mut SharedWriter,
) -> anyhow::Result<()> {
    let Some(current) = open else {
        writeln!(
            out,
            "  {} Open a chat first; /status applies to its service request.",
            style("!").yellow().bold()
        )?;
        return Ok(());
    };
    let Some(service_id) = current.chat.service_request_id else {
        writeln!(
            out,
            "  {} This chat has no linked service request.",
            style("!").yellow().bold()
        )?;
        return Ok(());
    };

    match raw.parse::<ServiceStatus>() {
        Ok(status) => {
            for participant in current.chat.participants.iter().filter(|p| **p != user_id) {
                send_client_event(
                    ws_write,
                    &ClientEvent::ServiceUpdate {
                        service_id,
                        user_id: *participant,
                        status,
                    },
                )
                .await?;
            }
            writeln!(
                out,
                "  {} Status update sent: {status}",
                style("*").cyan().bold()
            )?;
        }
        Err(e) => writeln!(out, "  {} {e}", style("!").yellow().bold())?,
    }
    Ok(())
}

/// List the user's chats with last-message previews.
async fn show_chats(
    api: &RemoteApi,
    renderer: &ChatRenderer,
    user_id: Uuid,
    out: &mut SharedWriter,
) -> anyhow::Result<()> {
    let summaries = api.list_chats(&user_id).await?;
    writeln!(out)?;
    if summaries.is_empty() {
        writeln!(out, "  {}", style("No chats yet.").dim())?;
    } else {
        for summary in &summaries {
            writeln!(out, "{}", renderer.chat_summary_line(summary))?;
        }
        writeln!(out)?;
        writeln!(out, "  {}", style("/open <id> to start chatting").dim())?;
    }
    Ok(())
}

async fn send_client_event(ws_write: &mut WsSink, event: &ClientEvent) -> anyhow::Result<()> {
    let json = serde_json::to_string(event)?;
    ws_write
        .send(WsMessage::Text(json.into()))
        .await
        .context("websocket send failed")?;
    Ok(())
}

fn set_chat_prompt(input: &mut ChatInput, chat_id: &Uuid) {
    input.update_prompt(&format!(
        "  {} {} ",
        style(short_id(chat_id)).cyan(),
        style(">").green().bold()
    ));
}

fn print_banner(server: &str, user_id: &Uuid) {
    println!();
    println!(
        "  {} {}",
        style("Worklink").cyan().bold(),
        style("chat").bold()
    );
    println!("  {}  {}", style("Server:").bold(), style(server).dim());
    println!(
        "  {}    {}",
        style("User:").bold(),
        style(user_id.to_string()).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
