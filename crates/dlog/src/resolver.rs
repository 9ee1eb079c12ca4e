//! Resolving a service name fragment against `docker service ls`.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use command_executor::{Command, Launcher};
use futures_lite::future;
use tracing::debug;

/// `docker service ls --format {{.Name}}`
pub fn list_services_command() -> Command {
    Command::builder("docker")
        .args(["service", "ls", "--format", "{{.Name}}"])
        .build()
}

/// First service whose name contains `fragment` (case-sensitive)
pub fn select_service<'a>(services: &'a [String], fragment: &str) -> Option<&'a str> {
    services
        .iter()
        .map(String::as_str)
        .find(|name| name.contains(fragment))
}

/// Looks up full service names through a launcher
#[derive(Debug)]
pub struct ServiceResolver<'a, L: Launcher> {
    launcher: &'a L,
    target_label: String,
    cancel: &'a CancellationToken,
}

impl<'a, L: Launcher> ServiceResolver<'a, L> {
    /// Resolve services via `launcher`; `target_label` is used in messages.
    ///
    /// A listing still running when `cancel` fires is abandoned with
    /// [`Error::Interrupted`].
    pub fn new(
        launcher: &'a L,
        target_label: impl Into<String>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            launcher,
            target_label: target_label.into(),
            cancel,
        }
    }

    /// All service names, in listing order
    pub async fn list_services(&self) -> Result<Vec<String>> {
        let listing = future::or(
            async {
                self.cancel.cancelled().await;
                None
            },
            async { Some(self.launcher.execute(list_services_command()).await) },
        )
        .await;

        let Some(result) = listing else {
            debug!("Service listing on {} interrupted", self.target_label);
            return Err(Error::Interrupted);
        };
        let result = result?;

        if !result.status.success() {
            return Err(Error::RemoteCommand {
                code: result.status.code,
                stderr: result.stderr_text(),
            });
        }

        Ok(result
            .stdout
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// The full name of the first service containing `fragment`
    pub async fn resolve(&self, fragment: &str) -> Result<String> {
        let services = self.list_services().await?;
        debug!("{} services on {}", services.len(), self.target_label);

        let chosen = select_service(&services, fragment).ok_or_else(|| Error::ServiceNotFound {
            fragment: fragment.to_string(),
            target: self.target_label.clone(),
        })?;

        let others: Vec<&str> = services
            .iter()
            .map(String::as_str)
            .filter(|name| *name != chosen && name.contains(fragment))
            .collect();
        if !others.is_empty() {
            debug!("'{}' also matches {:?}; using {}", fragment, others, chosen);
        }

        Ok(chosen.to_string())
    }
}
