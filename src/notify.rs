// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Normal,
    Destructive,
}

/// A short, dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) severity: Severity,
}

impl Notice {
    pub(crate) fn normal<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Normal,
        }
    }

    pub(crate) fn destructive<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

pub(crate) trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Writes notices to standard error, where they don't get mixed up with
/// command output.
pub(crate) struct Terminal;

impl Notifier for Terminal {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Normal => {
                info!("Notice: {}", notice);
                eprintln!("{notice}");
            }
            Severity::Destructive => {
                warn!("Notice: {}", notice);
                eprintln!("Error: {notice}");
            }
        }
    }
}
