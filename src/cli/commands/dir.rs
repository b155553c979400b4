//! Interactive directory and file manager.

use crate::cli::{Output, Prompter};
use crate::files::{self, CreateOutcome, FileAction};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

/// Result lines of the manager. Questions go through the [`Prompter`].
trait Status {
    fn info(&mut self, msg: &str);
    fn success(&mut self, msg: &str);
    fn warning(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Colour-coded terminal output.
struct Terminal;

impl Status for Terminal {
    fn info(&mut self, msg: &str) {
        Output::info(msg);
    }

    fn success(&mut self, msg: &str) {
        Output::success(msg);
    }

    fn warning(&mut self, msg: &str) {
        Output::warning(msg);
    }

    fn error(&mut self, msg: &str) {
        Output::error(msg);
    }
}

/// Run the dir command on stdin/stdout.
pub fn run_dir() -> Result<()> {
    let mut prompter = Prompter::stdio();
    manage(&mut prompter, &mut Terminal)
}

/// Loop until the user answers anything but `Y`.
fn manage<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    status: &mut dyn Status,
) -> Result<()> {
    while prompter.confirm("Type \"Y\" to continue else \"N\" to exit: ", "y")? {
        let Some(answer) = prompter.ask(
            "Type \"create_d\" to create or \"delete_d\" to delete a directory, or \"create_f\"/\"delete_f\" for files: ",
        )?
        else {
            break;
        };

        let action = match answer.parse::<FileAction>() {
            Ok(action) => action,
            Err(message) => {
                status.warning(&message);
                continue;
            }
        };

        if let Err(e) = step(prompter, status, action) {
            status.error(&format!("An error occurred: {}", e));
        }
    }
    status.info("Exiting.....");
    Ok(())
}

fn step<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    status: &mut dyn Status,
    action: FileAction,
) -> Result<()> {
    match action {
        FileAction::CreateDirectory => {
            let Some(name) = prompter.ask("Enter name for directory: ")? else {
                return Ok(());
            };
            match files::create_directory(Path::new(&name))? {
                CreateOutcome::Created(_) => status.success("Directory created successfully!"),
                CreateOutcome::AlreadyExists(path) => {
                    status.warning("Directory is already existing.");
                    if prompter.confirm(
                        "Do you want to change its name with the current one? Type Yes or press Enter: ",
                        "yes",
                    )? {
                        let Some(new_name) = prompter.ask("Enter new name for the directory: ")?
                        else {
                            return Ok(());
                        };
                        files::rename_directory(&path, Path::new(&new_name))?;
                        status.success("Directory's name has been updated successfully!");
                    }
                }
            }
        }
        FileAction::DeleteDirectory => {
            let Some(name) = prompter.ask("Enter name of the directory: ")? else {
                return Ok(());
            };
            let path = Path::new(&name);
            if !path.is_dir() {
                status.error(&format!("Directory '{}' does not exist.", name));
                return Ok(());
            }
            prompter.say(&format!("Do you want to delete {} named directory?", name))?;
            if prompter.confirm("Type \"yes\" if you agree: ", "yes")? {
                files::delete_directory(path)?;
                status.success("Directory deleted successfully!");
            }
        }
        FileAction::CreateFile => {
            let Some(dir) = existing_dir(prompter, status, "Enter the directory to add file: ")?
            else {
                return Ok(());
            };
            let Some(name) = prompter.ask("Enter name for the file (with extension): ")? else {
                return Ok(());
            };
            match files::create_file(Path::new(&dir), &name)? {
                CreateOutcome::Created(_) => {
                    status.success(&format!("File created in {} successfully", dir))
                }
                CreateOutcome::AlreadyExists(_) => status.warning("File already exists"),
            }
        }
        FileAction::DeleteFile => {
            let Some(dir) = existing_dir(prompter, status, "Enter directory to delete file from: ")?
            else {
                return Ok(());
            };
            let Some(name) = prompter.ask("Enter name for the file (with extension): ")? else {
                return Ok(());
            };
            if !Path::new(&dir).join(name.trim()).is_file() {
                status.error("File doesn't exist");
                return Ok(());
            }
            files::delete_file(Path::new(&dir), &name)?;
            status.success("File deleted successfully");
        }
    }
    Ok(())
}

/// Ask for a directory, reporting when it does not exist.
fn existing_dir<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    status: &mut dyn Status,
    question: &str,
) -> Result<Option<String>> {
    let Some(dir) = prompter.ask(question)? else {
        return Ok(None);
    };
    if Path::new(&dir).is_dir() {
        Ok(Some(dir))
    } else {
        status.error("Directory doesn't exist");
        Ok(None)
    }
}
