// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use clap::Subcommand;
use studydesk_core::Grade;
use studydesk_core::NonStudyDays;
use studydesk_core::RecordId;
use studydesk_core::Timestamp;

use crate::cmd::card::add_card;
use crate::cmd::card::delete_card;
use crate::cmd::card::edit_card;
use crate::cmd::card::grade;
use crate::cmd::card::list_due;
use crate::cmd::card::show_card;
use crate::cmd::export::export_collection;
use crate::cmd::revision::add_revision;
use crate::cmd::revision::apply_action;
use crate::cmd::revision::delete_revision;
use crate::cmd::revision::edit_revision;
use crate::cmd::revision::list_revisions;
use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::db::RevisionAction;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Commands relating to flashcards.
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },
    /// Commands relating to revision items.
    Revision {
        #[command(subcommand)]
        command: RevisionCommand,
    },
    /// Export a collection as JSON.
    Export {
        /// Path to the data directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<String>,
    },
    /// Serve a collection through a JSON HTTP API.
    Serve {
        /// Path to the data directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The host address to bind to. Defaults to the configured host.
        #[arg(long)]
        host: Option<String>,
        /// The port to use for the web server. Defaults to the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a new card. It is due immediately.
    Add {
        front: String,
        back: String,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Grade a card: again, hard, good, or easy.
    Grade {
        id: RecordId,
        grade: Grade,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the cards that are due now.
    Due {
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print a card as JSON.
    Show {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Change the text of a card without touching its schedule.
    Edit {
        id: RecordId,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Delete a card.
    Delete {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
}

#[derive(Subcommand)]
enum RevisionCommand {
    /// Add a new revision item, first due tomorrow.
    Add {
        title: String,
        /// Weekdays to never schedule on, e.g. `sat,sun` or `0,6`. Defaults to the configured days.
        #[arg(long)]
        non_study_days: Option<NonStudyDays>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List revision items grouped by category.
    List {
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Mark a revision item as complete without rescheduling it.
    Complete {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Postpone a revision item to tomorrow.
    Postpone {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Move a revision item to its next interval.
    Advance {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Rename a revision item or change its non-study days.
    Edit {
        id: RecordId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        non_study_days: Option<NonStudyDays>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Delete a revision item.
    Delete {
        id: RecordId,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    let now = Timestamp::now();
    match cli {
        Command::Card { command } => match command {
            CardCommand::Add {
                front,
                back,
                directory,
            } => add_card(directory, front, back, now).map(|_| ()),
            CardCommand::Grade {
                id,
                grade: g,
                directory,
            } => grade(directory, id, g, now),
            CardCommand::Due { directory } => list_due(directory, now),
            CardCommand::Show { id, directory } => show_card(directory, id),
            CardCommand::Edit {
                id,
                front,
                back,
                directory,
            } => edit_card(directory, id, front, back),
            CardCommand::Delete { id, directory } => delete_card(directory, id),
        },
        Command::Revision { command } => match command {
            RevisionCommand::Add {
                title,
                non_study_days,
                directory,
            } => add_revision(directory, title, non_study_days, now).map(|_| ()),
            RevisionCommand::List { directory } => list_revisions(directory, now),
            RevisionCommand::Complete { id, directory } => {
                apply_action(directory, id, RevisionAction::Complete, now)
            }
            RevisionCommand::Postpone { id, directory } => {
                apply_action(directory, id, RevisionAction::Postpone, now)
            }
            RevisionCommand::Advance { id, directory } => {
                apply_action(directory, id, RevisionAction::Advance, now)
            }
            RevisionCommand::Edit {
                id,
                title,
                non_study_days,
                directory,
            } => edit_revision(directory, id, title, non_study_days),
            RevisionCommand::Delete { id, directory } => delete_revision(directory, id),
        },
        Command::Export { directory, output } => export_collection(directory, output),
        Command::Serve {
            directory,
            host,
            port,
        } => {
            let config = ServerConfig {
                directory,
                host,
                port,
            };
            start_server(config).await
        }
    }
}
