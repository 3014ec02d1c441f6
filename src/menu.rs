//! Interactive text menu over stdin/stdout.
//!
//! A thin caller of `JobStore`: every choice maps to one store operation.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::error::Error;
use crate::jobs::{AddOutcome, ApplyOutcome, JobFilter, JobRecord, JobStore, NewJob};

const BANNER: &str = concat!(
    "\n=============================\n",
    "       YOUR JOB LIST\n",
    "=============================",
);

const CHOICES: &str = "1) Add job\n\
2) Show all jobs\n\
3) Show only jobs NOT applied to\n\
4) Mark job as APPLIED\n\
5) Delete job\n\
6) Quit";

/// Menu loop reading commands from `R` and writing to `W`.
pub struct Menu<R, W> {
    store: Arc<JobStore>,
    input: Lines<R>,
    output: W,
}

impl<R, W> Menu<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(store: Arc<JobStore>, input: R, output: W) -> Self {
        Self {
            store,
            input: input.lines(),
            output,
        }
    }

    /// Consume the menu and hand back the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user quits or input ends.
    pub async fn run(&mut self) -> Result<(), Error> {
        loop {
            self.say(BANNER).await?;
            self.say(CHOICES).await?;

            let Some(choice) = self.prompt("\nChoose (1-6): ").await? else {
                break;
            };

            match choice.as_str() {
                "1" => self.add_job().await?,
                "2" => self.list_jobs(JobFilter::All).await?,
                "3" => self.list_jobs(JobFilter::Open).await?,
                "4" => self.mark_applied().await?,
                "5" => self.delete_job().await?,
                "6" => {
                    self.say("\nGoodbye. Go apply for more jobs.").await?;
                    break;
                }
                _ => self.say("Invalid choice, try again.").await?,
            }
        }
        Ok(())
    }

    async fn add_job(&mut self) -> Result<(), Error> {
        self.say("\n--- Add new job ---").await?;
        let Some(title) = self.prompt("Job title: ").await? else {
            return Ok(());
        };
        let Some(company) = self.prompt("Company: ").await? else {
            return Ok(());
        };
        let link = self.prompt("Link to posting (optional): ").await?;
        let notes = self.prompt("Notes (optional): ").await?;

        let new = NewJob {
            title,
            company,
            link,
            notes,
        };

        match self.store.add(&new).await? {
            AddOutcome::Created(job) => {
                let msg = format!("\nAdded job #{} - {} at {}", job.id, job.title, job.company);
                self.say(&msg).await?;
            }
            AddOutcome::Invalid(_) => {
                self.say("Title and company are required. Try again.").await?;
            }
        }
        Ok(())
    }

    async fn list_jobs(&mut self, filter: JobFilter) -> Result<(), Error> {
        let all = self.store.list(JobFilter::All).await?;
        if all.is_empty() {
            self.say("\n(No jobs saved yet.)").await?;
            return Ok(());
        }

        let shown: Vec<&JobRecord> = all.iter().filter(|j| filter.matches(j)).collect();
        if shown.is_empty() {
            self.say("\n(No jobs match the filter.)").await?;
            return Ok(());
        }

        self.say("\n--- Jobs ---").await?;
        for job in shown {
            let text = render_job(job);
            self.say(&text).await?;
        }
        Ok(())
    }

    async fn mark_applied(&mut self) -> Result<(), Error> {
        if self.store.list(JobFilter::All).await?.is_empty() {
            self.say("\nThere are no jobs to mark.").await?;
            return Ok(());
        }
        self.list_jobs(JobFilter::Open).await?;

        let Some(id) = self.prompt_id("\nEnter the ID of the job you applied for: ").await? else {
            return Ok(());
        };

        match self.store.mark_applied(id).await? {
            ApplyOutcome::Applied(_) => self.say(&format!("\nMarked job #{id} as applied.")).await?,
            ApplyOutcome::AlreadyApplied(_) => {
                self.say("This job is already marked as applied.").await?
            }
            ApplyOutcome::NotFound => self.say("No job found with that ID.").await?,
        }
        Ok(())
    }

    async fn delete_job(&mut self) -> Result<(), Error> {
        let Some(id) = self.prompt_id("\nEnter the ID of the job to delete: ").await? else {
            return Ok(());
        };

        if self.store.delete(id).await? {
            self.say(&format!("\nDeleted job #{id}.")).await?;
        } else {
            self.say("No job found with that ID.").await?;
        }
        Ok(())
    }

    /// Prompt for an id. Prints an error and returns `None` on bad input.
    async fn prompt_id(&mut self, label: &str) -> Result<Option<u64>, Error> {
        let Some(raw) = self.prompt(label).await? else {
            return Ok(None);
        };
        match raw.parse::<u64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                self.say("Invalid ID (must be a number).").await?;
                Ok(None)
            }
        }
    }

    /// Print `label` and read one trimmed line. `None` on EOF.
    async fn prompt(&mut self, label: &str) -> std::io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;
        Ok(self
            .input
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}

fn render_job(job: &JobRecord) -> String {
    let status = if job.applied { "APPLIED" } else { "NOT APPLIED" };
    let mut text = format!(
        "\nID: {} | {}\n  Title: {}\n  Company: {}",
        job.id, status, job.title, job.company
    );
    if let Some(link) = &job.link {
        text.push_str(&format!("\n  Link: {link}"));
    }
    if let Some(notes) = &job.notes {
        text.push_str(&format!("\n  Notes: {notes}"));
    }
    if let Some(date) = job.date_applied {
        text.push_str(&format!("\n  Applied on: {}", date.format("%Y-%m-%d")));
    }
    text
}

/// Run the menu on the process's stdin/stdout.
pub async fn run_stdio(store: Arc<JobStore>) -> Result<(), Error> {
    let mut menu = Menu::new(store, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    menu.run().await
}
