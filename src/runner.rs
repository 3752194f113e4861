use crate::command::ConversionCommand;
use crate::error::ConversionError;
use log::debug;

/// Runs one conversion to completion.
pub trait ProcessRunner {
    fn run(&mut self, command: &ConversionCommand) -> Result<(), ConversionError>;
}

/// Spawns the converter as a child process and blocks until it exits.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, command: &ConversionCommand) -> Result<(), ConversionError> {
        debug!("Running {}", command);

        let output = command.to_process_command().output()?;

        if !output.stderr.is_empty() {
            debug!("converter stderr: {}", String::from_utf8_lossy(&output.stderr).trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            match output.status.code() {
                Some(code) => Err(ConversionError::ExitStatus(code)),
                None => Err(ConversionError::Terminated),
            }
        }
    }
}

/// Logs commands instead of running them.
#[derive(Debug, Default)]
pub struct DryRunner {
    pub commands: Vec<String>,
}

impl ProcessRunner for DryRunner {
    fn run(&mut self, command: &ConversionCommand) -> Result<(), ConversionError> {
        self.commands.push(command.to_string());
        Ok(())
    }
}
