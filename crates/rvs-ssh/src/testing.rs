// ABOUTME: Test doubles for the command-execution seam.
// ABOUTME: RecordingRunner records every invocation and emulates ssh-keygen with real keys.

use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner};
use crate::key::public_key_path;
use ssh_key::{Algorithm, LineEnding, PrivateKey};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// One recorded external program run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Fake `CommandRunner` that never spawns processes.
///
/// - Outputs queued with `push_output` are returned in order per program;
///   when a program's queue is empty the run succeeds with empty output.
/// - A successful run of a program named `ssh-keygen` writes a real
///   ed25519 key pair to its `-f` path (whatever `-t` says).
/// - Programs registered with `with_missing` are not found by `locate`.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<Invocation>>,
    outputs: RefCell<HashMap<String, VecDeque<CommandOutput>>>,
    missing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// Queue the next output for `program`.
    pub fn push_output(&self, program: &str, output: CommandOutput) {
        self.outputs
            .borrow_mut()
            .entry(program.to_string())
            .or_default()
            .push_back(output);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program == program)
            .cloned()
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
        });

        if let Some(output) = self
            .outputs
            .borrow_mut()
            .get_mut(program)
            .and_then(VecDeque::pop_front)
        {
            return Ok(output);
        }

        if is_keygen(program) {
            return Ok(emulate_keygen(args));
        }
        Ok(CommandOutput::ok(""))
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) {
            None
        } else {
            Some(Path::new("/usr/bin").join(program))
        }
    }
}

fn is_keygen(program: &str) -> bool {
    Path::new(program)
        .file_name()
        .is_some_and(|name| name == "ssh-keygen")
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn emulate_keygen(args: &[String]) -> CommandOutput {
    let Some(key_path) = flag_value(args, "-f") else {
        return CommandOutput::failed(1, "Too few arguments.");
    };
    let comment = flag_value(args, "-C").unwrap_or_default();

    match write_key_pair(Path::new(key_path), comment) {
        Ok(()) => CommandOutput::ok(""),
        Err(e) => CommandOutput::failed(1, format!("Saving key \"{key_path}\" failed: {e}")),
    }
}

/// Write a fresh ed25519 key pair in OpenSSH format to `key_path` and
/// `key_path.pub`, the way ssh-keygen lays them out.
pub fn write_key_pair(key_path: &Path, comment: &str) -> std::io::Result<()> {
    let to_io = |e: ssh_key::Error| std::io::Error::other(e.to_string());

    let private_key =
        PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519).map_err(to_io)?;
    let private_pem = private_key.to_openssh(LineEnding::LF).map_err(to_io)?;
    std::fs::write(key_path, private_pem.as_bytes())?;

    let public_line = private_key.public_key().to_openssh().map_err(to_io)?;
    let public_line = if comment.is_empty() {
        format!("{public_line}\n")
    } else {
        format!("{public_line} {comment}\n")
    };
    std::fs::write(public_key_path(key_path), public_line)
}
