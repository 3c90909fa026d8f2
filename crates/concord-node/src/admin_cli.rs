//! concord-admin CLI tool
//!
//! Drives a running Concord node by hand, standing in for the chat command
//! layer and the voting layer.
//!
//! Usage:
//!   concord-admin create-project <channel> <user> <name>
//!   concord-admin create-file <channel> <user> <name>
//!   concord-admin focus <channel> <user> <file>
//!   concord-admin append <channel> <user> <index> <content>
//!   concord-admin propose-edit <channel> <user> <line> <proposal_id> <content>
//!   concord-admin propose-delete-line <channel> <user> <line> <proposal_id>
//!   concord-admin propose-delete-file <channel> <user> <file> <proposal_id>
//!   concord-admin tally <proposal_id> <yes,...> [no,...]
//!   concord-admin list-files <channel>
//!   concord-admin view-file <channel> <file>
//!   concord-admin ping

use concord_core::{ProposalId, UserId};
use concord_node::{Request, Response};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("concord-admin - Drive a Concord node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  concord-admin create-project <channel> <user> <name>");
    eprintln!("  concord-admin create-file <channel> <user> <name>");
    eprintln!("  concord-admin focus <channel> <user> <file>");
    eprintln!("  concord-admin append <channel> <user> <index> <content>");
    eprintln!("  concord-admin propose-edit <channel> <user> <line> <proposal_id> <content>");
    eprintln!("  concord-admin propose-delete-line <channel> <user> <line> <proposal_id>");
    eprintln!("  concord-admin propose-delete-file <channel> <user> <file> <proposal_id>");
    eprintln!("  concord-admin tally <proposal_id> <yes,...> [no,...]");
    eprintln!("  concord-admin list-files <channel>");
    eprintln!("  concord-admin view-file <channel> <file>");
    eprintln!("  concord-admin ping");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CONCORD_SOCKET  Path to gateway socket (default: ./concord-data/concord.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("CONCORD_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./concord-data/concord.sock"))
}

fn send_request(request: &Request) -> Result<Response, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to concord-node at {:?}: {}\n\
             Is the concord-node running?",
            socket_path, e
        )
    })?;

    let request_json = serde_json::to_string(request).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", request_json).map_err(|e| e.to_string())?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn users(csv: Option<&String>) -> Vec<UserId> {
    csv.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(UserId::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_request(args: &[String]) -> Result<Request, String> {
    let need = |n: usize| {
        if args.len() < n + 1 {
            Err(format!("{} requires {} arguments", args[0], n))
        } else {
            Ok(())
        }
    };
    let number = |s: &str| {
        s.parse::<i64>()
            .map_err(|_| format!("{:?} is not a number", s))
    };
    let position = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| format!("{:?} is not a line number", s))
    };

    let request = match args[0].as_str() {
        "create-project" => {
            need(3)?;
            Request::CreateProject {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                name: args[3].clone(),
            }
        }
        "create-file" => {
            need(3)?;
            Request::CreateFile {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                name: args[3].clone(),
            }
        }
        "focus" => {
            need(3)?;
            Request::Focus {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                file: args[3].clone(),
            }
        }
        "append" => {
            need(4)?;
            Request::AppendLine {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                index: number(&args[3])?,
                content: args[4..].join(" "),
            }
        }
        "propose-edit" => {
            need(5)?;
            Request::ProposeEdit {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                line: position(&args[3])?,
                proposal_id: ProposalId::new(&args[4]),
                content: args[5..].join(" "),
            }
        }
        "propose-delete-line" => {
            need(4)?;
            Request::ProposeDeleteLine {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                line: position(&args[3])?,
                proposal_id: ProposalId::new(&args[4]),
            }
        }
        "propose-delete-file" => {
            need(4)?;
            Request::ProposeDeleteFile {
                channel: args[1].clone(),
                user: UserId::new(&args[2]),
                file: args[3].clone(),
                proposal_id: ProposalId::new(&args[4]),
            }
        }
        "tally" => {
            need(2)?;
            Request::VoteTally {
                proposal_id: ProposalId::new(&args[1]),
                yes: users(args.get(2)),
                no: users(args.get(3)),
            }
        }
        "list-files" => {
            need(1)?;
            Request::ListFiles {
                channel: args[1].clone(),
            }
        }
        "view-file" => {
            need(2)?;
            Request::ViewFile {
                channel: args[1].clone(),
                file: args[2].clone(),
            }
        }
        "ping" => Request::Ping,
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(request)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }
    if matches!(args[0].as_str(), "-h" | "--help" | "help") {
        print_usage();
        std::process::exit(0);
    }

    let request = match parse_request(&args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_request(&request) {
        Ok(response) => match response {
            Response::Ok { message } => {
                println!("{}", message);
            }
            Response::Error { kind, error } => {
                eprintln!("Error ({}): {}", kind, error);
                std::process::exit(1);
            }
            Response::Tally { applied, needed } => {
                if applied {
                    println!("applied");
                } else {
                    println!("pending - {} more approval(s) needed", needed);
                }
            }
            Response::List { items } => {
                if items.is_empty() {
                    println!("(none)");
                } else {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
            Response::Pong => {
                println!("pong - concord-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
