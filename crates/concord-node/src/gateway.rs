//! Unix socket gateway between the chat layers and the engine.
//!
//! Connections are served concurrently, but every request is forwarded to a
//! single engine thread and handled to completion before the next one.

use concord_core::{
    Engine, Error, FileRef, Outcome, ProjectKey, ProposalId, UserId, VoteTally,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Longest request line accepted, newline included.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Request sent over the socket.
///
/// Projects are addressed by channel. Line and file mutations act on the
/// requesting user's focused file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Create a project for a channel
    CreateProject {
        channel: String,
        user: UserId,
        name: String,
    },
    /// Create a file in the channel's project
    CreateFile {
        channel: String,
        user: UserId,
        name: String,
    },
    /// Switch the user's focused file
    Focus {
        channel: String,
        user: UserId,
        file: String,
    },
    /// Add a line to the focused file
    AppendLine {
        channel: String,
        user: UserId,
        index: i64,
        content: String,
    },
    /// Propose an edit to a line of the focused file
    ProposeEdit {
        channel: String,
        user: UserId,
        line: usize,
        proposal_id: ProposalId,
        content: String,
    },
    /// Propose deleting a line of the focused file
    ProposeDeleteLine {
        channel: String,
        user: UserId,
        line: usize,
        proposal_id: ProposalId,
    },
    /// Propose deleting a file by name
    ProposeDeleteFile {
        channel: String,
        user: UserId,
        file: String,
        proposal_id: ProposalId,
    },
    /// Current votes on a proposal
    VoteTally {
        proposal_id: ProposalId,
        #[serde(default)]
        yes: Vec<UserId>,
        #[serde(default)]
        no: Vec<UserId>,
    },
    /// File names in the channel's project
    ListFiles { channel: String },
    /// Line contents of a file
    ViewFile { channel: String, file: String },
    /// Health check
    Ping,
}

/// Response to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { message: String },
    Error { kind: String, error: String },
    Tally { applied: bool, needed: usize },
    List { items: Vec<String> },
    Pong,
}

impl From<Error> for Response {
    fn from(e: Error) -> Self {
        Response::Error {
            kind: e.kind().to_string(),
            error: e.to_string(),
        }
    }
}

/// Work item for the engine thread.
#[derive(Debug)]
pub enum Event {
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    Shutdown,
}

/// Handle one request against the engine.
pub fn handle(engine: &mut Engine, request: Request) -> Response {
    match dispatch(engine, request) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("request failed: {}", e);
            e.into()
        }
    }
}

fn project_id(engine: &Engine, channel: &str) -> concord_core::Result<String> {
    Ok(engine.project(ProjectKey::Channel(channel))?.id().to_string())
}

fn focused(engine: &Engine, channel: &str, user: &UserId) -> concord_core::Result<FileRef> {
    engine.current(&project_id(engine, channel)?, user)
}

fn dispatch(engine: &mut Engine, request: Request) -> concord_core::Result<Response> {
    let response = match request {
        Request::CreateProject {
            channel,
            user,
            name,
        } => {
            engine.create_project(&name, &channel, &user)?;
            Response::Ok {
                message: format!("Created project {}", name),
            }
        }
        Request::CreateFile {
            channel,
            user,
            name,
        } => {
            let project = project_id(engine, &channel)?;
            engine.create_file(&project, &name, &user)?;
            Response::Ok {
                message: format!("Created file {}", name),
            }
        }
        Request::Focus {
            channel,
            user,
            file,
        } => {
            let project = project_id(engine, &channel)?;
            engine.focus(&project, &user, &file)?;
            Response::Ok {
                message: format!("Now editing {}", file),
            }
        }
        Request::AppendLine {
            channel,
            user,
            index,
            content,
        } => {
            let file = focused(engine, &channel, &user)?;
            let line = engine.append_line(&file, index, &content, &user)?;
            Response::Ok {
                message: format!("Added line {}", line.index),
            }
        }
        Request::ProposeEdit {
            channel,
            user,
            line,
            proposal_id,
            content,
        } => {
            let file = focused(engine, &channel, &user)?;
            let line = engine.line_ref(&file, line)?;
            engine.propose_edit(&line, proposal_id.clone(), &user, &content)?;
            Response::Ok {
                message: format!("Proposed edit {}", proposal_id),
            }
        }
        Request::ProposeDeleteLine {
            channel,
            user,
            line,
            proposal_id,
        } => {
            let file = focused(engine, &channel, &user)?;
            let line = engine.line_ref(&file, line)?;
            engine.propose_delete_line(&line, proposal_id.clone(), &user)?;
            Response::Ok {
                message: format!("Proposed deletion {}", proposal_id),
            }
        }
        Request::ProposeDeleteFile {
            channel,
            user,
            file,
            proposal_id,
        } => {
            let project = project_id(engine, &channel)?;
            let file = engine.file_ref(&project, &file)?;
            engine.propose_delete_file(&file, proposal_id.clone(), &user)?;
            Response::Ok {
                message: format!("Proposed file deletion {}", proposal_id),
            }
        }
        Request::VoteTally {
            proposal_id,
            yes,
            no,
        } => match engine.on_vote_tally(&VoteTally::new(proposal_id, yes, no))? {
            Outcome::Applied => Response::Tally {
                applied: true,
                needed: 0,
            },
            Outcome::Pending { needed, .. } => Response::Tally {
                applied: false,
                needed,
            },
        },
        Request::ListFiles { channel } => Response::List {
            items: engine.list_files(&project_id(engine, &channel)?)?,
        },
        Request::ViewFile { channel, file } => Response::List {
            items: engine.view_file(&project_id(engine, &channel)?, &file)?,
        },
        Request::Ping => Response::Pong,
    };
    Ok(response)
}

/// Run the engine on its own thread, handling one event at a time.
///
/// The engine is handed back when a [`Event::Shutdown`] arrives or every
/// sender is dropped.
pub fn spawn_engine(mut engine: Engine) -> (mpsc::Sender<Event>, JoinHandle<Engine>) {
    let (tx, mut rx) = mpsc::channel::<Event>(64);
    let task = tokio::task::spawn_blocking(move || {
        while let Some(event) = rx.blocking_recv() {
            match event {
                Event::Request { request, reply } => {
                    let response = handle(&mut engine, request);
                    // requester may have hung up
                    let _ = reply.send(response);
                }
                Event::Shutdown => break,
            }
        }
        engine
    });
    (tx, task)
}

/// Accept connections forever, forwarding requests to the engine.
pub async fn serve(listener: UnixListener, events: mpsc::Sender<Event>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, events).await {
                        tracing::error!("Gateway connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept gateway connection: {}", e);
            }
        }
    }
}

/// Bind the gateway socket, replacing a stale one.
pub fn bind(socket_path: &Path) -> std::io::Result<UnixListener> {
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    tracing::info!("Gateway listening on {:?}", socket_path);
    Ok(listener)
}

async fn handle_connection(stream: UnixStream, events: mpsc::Sender<Event>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        let read = (&mut reader)
            .take(MAX_REQUEST_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            break;
        }

        if line.len() > MAX_REQUEST_BYTES {
            tracing::warn!(limit = MAX_REQUEST_BYTES, "request too large, closing connection");
            let response = Response::Error {
                kind: "invalid_request".to_string(),
                error: format!("Request exceeds {} bytes", MAX_REQUEST_BYTES),
            };
            let response_json = serde_json::to_string(&response)? + "\n";
            writer.write_all(response_json.as_bytes()).await?;
            return Ok(());
        }

        let response = match serde_json::from_slice::<Request>(&line) {
            Ok(request) => forward(&events, request).await,
            Err(e) => Response::Error {
                kind: "invalid_request".to_string(),
                error: format!("Invalid request: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

async fn forward(events: &mpsc::Sender<Event>, request: Request) -> Response {
    let (reply, response) = oneshot::channel();
    if events.send(Event::Request { request, reply }).await.is_err() {
        return unavailable();
    }
    response.await.unwrap_or_else(|_| unavailable())
}

fn unavailable() -> Response {
    Response::Error {
        kind: "unavailable".to_string(),
        error: "engine is shutting down".to_string(),
    }
}
