use crate::error::AccountError;
use crate::store::UserStore;
use crate::user::{NewUser, Role, User};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

/// Account operations, usable as one-shot subcommands or REPL lines
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        username: String,
        password: String,
        #[arg(long, default_value_t = Role::User)]
        role: Role,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Check a username and password
    Login { username: String, password: String },
    /// Change a password, given the current one
    Passwd {
        username: String,
        old_password: String,
        new_password: String,
    },
    /// Replace email and phone; an omitted field is cleared
    UpdateInfo {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show one account
    Show { username: String },
    /// List all accounts
    Users,
    /// Delete an account
    Remove { username: String },
}

#[derive(Debug, Parser)]
#[command(name = "shelf", no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Debug, Subcommand)]
enum ReplCommand {
    #[command(flatten)]
    Account(Command),
    /// Show the logged-in user
    Whoami,
    /// Forget the logged-in user
    Logout,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

/// A store plus the user who last logged in through this front end
pub struct Session {
    store: UserStore,
    current: Option<String>,
}

impl Session {
    pub fn new(store: UserStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Describe the logged-in user, marking administrators
    pub fn whoami(&self) -> String {
        match self.current.as_deref().and_then(|name| self.store.get_user(name)) {
            Some(user) if user.is_admin() => format!("{} (admin)", user.username),
            Some(user) => user.username.clone(),
            None => "Not logged in".to_string(),
        }
    }

    /// Run one account command and return the text to show the user
    pub fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Register {
                username,
                password,
                role,
                email,
                phone,
            } => {
                require_credentials(&username, &password)?;
                let new_user = NewUser::new(username, password)
                    .role(role)
                    .email(non_empty(email))
                    .phone(non_empty(phone));
                let user = self.store.register(new_user).map_err(describe)?;
                Ok(format!("Registered {} ({})", user.username, user.role))
            }
            Command::Login { username, password } => {
                require_credentials(&username, &password)?;
                let user = self.store.login(&username, &password)?;
                let message = format!("Logged in as {} ({})", user.username, user.role);
                self.current = Some(username);
                Ok(message)
            }
            Command::Passwd {
                username,
                old_password,
                new_password,
            } => {
                if old_password.is_empty() || new_password.is_empty() {
                    bail!("password must not be empty");
                }
                self.store
                    .change_password(&username, &old_password, &new_password)
                    .map_err(describe)?;
                // A changed password requires logging in again.
                if self.current.as_deref() == Some(username.as_str()) {
                    self.current = None;
                    return Ok(format!(
                        "Password changed for {}; please log in again",
                        username
                    ));
                }
                Ok(format!("Password changed for {}", username))
            }
            Command::UpdateInfo {
                username,
                email,
                phone,
            } => {
                self.store
                    .update_user_info(&username, non_empty(email), non_empty(phone))
                    .map_err(describe)?;
                Ok(format!("Updated contact info for {}", username))
            }
            Command::Show { username } => match self.store.get_user(&username) {
                Some(user) => Ok(format_user(user)),
                None => bail!("user '{}' not found", username),
            },
            Command::Users => Ok(format_user_table(self.store.users())),
            Command::Remove { username } => {
                if self.current.as_deref() == Some(username.as_str()) {
                    bail!("cannot remove the logged-in user");
                }
                let removed = self.store.remove_user(&username).map_err(describe)?;
                Ok(format!("Removed {}", removed.username))
            }
        }
    }
}

/// Flag store errors that left memory and disk out of step
fn describe(err: AccountError) -> anyhow::Error {
    if err.is_persistence() {
        anyhow::Error::new(err).context("change kept in memory but not saved")
    } else {
        err.into()
    }
}

fn require_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        bail!("username and password must not be empty");
    }
    Ok(())
}

/// Blank contact fields count as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn format_user(user: &User) -> String {
    format!(
        "username: {}\nrole:     {}\nemail:    {}\nphone:    {}",
        user.username,
        user.role,
        user.email.as_deref().unwrap_or("-"),
        user.phone.as_deref().unwrap_or("-"),
    )
}

fn format_user_table(users: &[User]) -> String {
    if users.is_empty() {
        return "No users".to_string();
    }
    let width = users
        .iter()
        .map(|u| u.username.chars().count())
        .max()
        .unwrap_or(0)
        .max("USERNAME".len());

    let mut out = format!("{:<width$}  {:<5}  {:<24}  PHONE", "USERNAME", "ROLE", "EMAIL");
    for user in users {
        out.push_str(&format!(
            "\n{:<width$}  {:<5}  {:<24}  {}",
            user.username,
            user.role.as_str(),
            user.email.as_deref().unwrap_or("-"),
            user.phone.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub fn run_once(session: &mut Session, command: Command) -> Result<()> {
    let output = session.execute(command)?;
    println!("{}", output);
    Ok(())
}

pub fn run_repl(mut session: Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("shelf - type help for commands, exit to quit");

    loop {
        let prompt = format!("{}> ", session.current_user().unwrap_or("shelf"));
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let words = match shell_words::split(line) {
                    Ok(words) => words,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        continue;
                    }
                };
                if !carries_password(&words) {
                    rl.add_history_entry(line)?;
                }
                if handle_words(&mut session, words) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Commands whose arguments include a plaintext password
fn carries_password(words: &[String]) -> bool {
    matches!(
        words.first().map(String::as_str),
        Some("register" | "login" | "passwd")
    )
}

/// Returns true when the shell should exit
fn handle_words(session: &mut Session, words: Vec<String>) -> bool {
    let parsed = match ReplLine::try_parse_from(words) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Covers `help` and `<cmd> --help` as well as usage errors.
            if let Err(err) = e.print() {
                warn!("Failed to write usage message: {}", err);
            }
            return false;
        }
    };

    match parsed.command {
        ReplCommand::Exit => return true,
        ReplCommand::Whoami => println!("{}", session.whoami()),
        ReplCommand::Logout => {
            session.current = None;
            println!("Logged out");
        }
        ReplCommand::Account(command) => match session.execute(command) {
            Ok(output) => println!("{}", output),
            Err(e) => eprintln!("Error: {:#}", e),
        },
    }
    false
}
