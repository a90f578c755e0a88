use std::{path::PathBuf, str::FromStr, sync::Arc};

use admin_views::{
    check_access, AccessDecision, BulkOutcome, FormVariant, NodesView, RedirectForm, Route,
    SessionsView, SortRule, SubmitOutcome, UnknownField,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ConsoleApi, HttpConsoleClient};
use shared::{
    domain::{NodeKey, SessionKey},
    protocol::CurrentUser,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod output;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Manage live session redirects and node domains")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    calendar_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    timeout_seconds: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in user and whether they may use the console.
    Whoami,
    #[command(subcommand)]
    Sessions(SessionsCommand),
    #[command(subcommand)]
    Redirect(RedirectCommand),
    #[command(subcommand)]
    Nodes(NodesCommand),
    /// Open a console page by path, e.g. `/sessions`.
    Open { path: String },
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    List {
        /// Column name, optionally suffixed with `:desc`. Repeatable; applied in order.
        #[arg(long, value_name = "FIELD[:desc]")]
        sort: Vec<String>,
        #[arg(long)]
        filter: Option<String>,
    },
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    Restore {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum RedirectCommand {
    Show {
        key: String,
    },
    Create {
        #[arg(long)]
        redirect_to: String,
        #[arg(long)]
        video_link: Option<String>,
        /// Session id to attach the redirect to.
        #[arg(long)]
        key: Option<String>,
    },
    Edit {
        key: String,
        #[arg(long)]
        redirect_to: Option<String>,
        #[arg(long)]
        video_link: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        start_minutes: Option<i64>,
    },
    Stats {
        key: String,
    },
}

#[derive(Subcommand, Debug)]
enum NodesCommand {
    List {
        #[arg(long, value_name = "FIELD[:desc]")]
        sort: Vec<String>,
    },
    Add {
        domain: String,
    },
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}

/// Config file and environment first, command-line flags last.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = &cli.api_url {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = &cli.calendar_url {
        settings.calendar_base_url = Some(v.clone());
    }
    if let Some(v) = &cli.token {
        settings.access_token = Some(v.clone());
    }
    if let Some(v) = cli.timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    Ok(settings)
}

fn parse_sort_rules<F>(raw: &[String]) -> Result<Vec<SortRule<F>>>
where
    F: FromStr<Err = UnknownField>,
{
    raw.iter()
        .map(|rule| -> Result<SortRule<F>> {
            let (name, direction) = rule.split_once(':').unwrap_or((rule.as_str(), "asc"));
            let field = name.trim().parse::<F>()?;
            match direction.trim().to_ascii_lowercase().as_str() {
                "" | "asc" => Ok(SortRule::ascending(field)),
                "desc" => Ok(SortRule::descending(field)),
                other => bail!("unknown sort direction '{other}' in '{rule}'"),
            }
        })
        .collect()
}

async fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;
    let client = HttpConsoleClient::new(settings.client_options()?)
        .context("failed to build console api client")?;
    info!(api = %client.api_base(), "console client ready");
    let api: Arc<dyn ConsoleApi> = Arc::new(client);

    match cli.command {
        Command::Whoami => whoami(api.as_ref()).await,
        Command::Sessions(command) => sessions(api, command).await,
        Command::Redirect(command) => redirect(api, command).await,
        Command::Nodes(command) => nodes(api, command).await,
        Command::Open { path } => open(api, &path).await,
    }
}

async fn require_access(api: &dyn ConsoleApi) -> Result<CurrentUser> {
    match check_access(api).await {
        AccessDecision::Granted(user) => Ok(user),
        denied => bail!(denied.denial_message().unwrap_or_default()),
    }
}

fn report(verb: &str, outcome: Option<BulkOutcome>) -> Result<()> {
    let Some(outcome) = outcome else {
        println!("nothing selected");
        return Ok(());
    };
    println!(
        "{verb} {} of {}",
        outcome.attempted - outcome.failed,
        outcome.attempted
    );
    if outcome.failed > 0 {
        bail!("{} request(s) failed", outcome.failed);
    }
    Ok(())
}

async fn whoami(api: &dyn ConsoleApi) -> Result<()> {
    let decision = check_access(api).await;
    if let Some(user) = decision.user() {
        let login = user.login_name.as_deref().unwrap_or("unknown");
        println!("{} ({login})", user.display_name.as_deref().unwrap_or(login));
        println!("permissions: {}", user.permissions.join(", "));
    }
    if let Some(message) = decision.denial_message() {
        bail!(message);
    }
    Ok(())
}

async fn open(api: Arc<dyn ConsoleApi>, path: &str) -> Result<()> {
    let route = Route::parse(path);
    info!(route = route.title(), "opening console page");
    match route {
        Route::Home => whoami(api.as_ref()).await,
        Route::Sessions => {
            sessions(
                api,
                SessionsCommand::List {
                    sort: Vec::new(),
                    filter: None,
                },
            )
            .await
        }
        Route::Nodes => nodes(api, NodesCommand::List { sort: Vec::new() }).await,
        Route::NotFound(path) => bail!("page not found: {path}"),
    }
}

async fn sessions(api: Arc<dyn ConsoleApi>, command: SessionsCommand) -> Result<()> {
    let user = require_access(api.as_ref()).await?;
    let mut view = SessionsView::new(api, Some(user));

    match command {
        SessionsCommand::List { sort, filter } => {
            if !sort.is_empty() {
                view.set_sorting(parse_sort_rules(&sort)?);
            }
            if let Some(filter) = filter {
                view.set_filter(filter);
            }
            view.reload().await;
            let rows = view.rows();
            println!("{}", output::sessions_table(&rows));
            println!("{} of {} sessions", rows.len(), view.source().len());
            Ok(())
        }
        SessionsCommand::Delete { keys } => {
            view.selection_mut()
                .select_all(keys.into_iter().map(SessionKey::from));
            let outcome = view.delete_selected().await;
            report("deleted", outcome)
        }
        SessionsCommand::Restore { keys } => {
            view.selection_mut()
                .select_all(keys.into_iter().map(SessionKey::from));
            let outcome = view.restore_selected().await;
            report("restored", outcome)
        }
    }
}

async fn open_form(
    api: &Arc<dyn ConsoleApi>,
    variant: FormVariant,
    key: Option<SessionKey>,
) -> Result<RedirectForm> {
    let mut form = RedirectForm::new(Arc::clone(api), variant, key);
    form.load().await;
    if form.has_error() {
        bail!("failed to load redirect {:?}", form.key().map(SessionKey::as_str));
    }
    Ok(form)
}

fn print_form(form: &RedirectForm) {
    println!("{}", form.heading());
    if let Some(key) = form.key() {
        println!("key:            {key}");
    }
    if let Some(session) = form.session() {
        println!("session:        {}", session.title);
        println!("speakers:       {}", session.speaker_names().join(", "));
    }
    println!("redirect to:    {}", form.redirect_to());
    println!("video link:     {}", form.video_link());
    if form.variant() == FormVariant::SessionRedirect {
        println!("start minutes:  {}", form.start_redirecting_minutes());
    }
}

async fn save(form: &mut RedirectForm, parent: &mut SessionsView) -> Result<()> {
    if !form.can_submit() {
        bail!("redirect target must be an http(s) URL; the video link must be empty or an http(s) URL");
    }
    match form.submit(parent).await {
        SubmitOutcome::Saved => {
            println!("saved; {} sessions listed", parent.source().len());
            Ok(())
        }
        SubmitOutcome::Failed => bail!("saving the redirect failed"),
        SubmitOutcome::NotReady => bail!("nothing was saved"),
    }
}

async fn redirect(api: Arc<dyn ConsoleApi>, command: RedirectCommand) -> Result<()> {
    let user = require_access(api.as_ref()).await?;
    let mut parent = SessionsView::new(Arc::clone(&api), Some(user));

    match command {
        RedirectCommand::Show { key } => {
            let form = open_form(&api, FormVariant::SessionRedirect, Some(key.into())).await?;
            print_form(&form);
        }
        RedirectCommand::Create {
            redirect_to,
            video_link,
            key,
        } => {
            let key = key.map(SessionKey::from);
            let variant = if key.is_some() {
                FormVariant::SessionRedirect
            } else {
                FormVariant::Redirect
            };
            let mut form = open_form(&api, variant, key).await?;
            if form.is_edit_mode() {
                bail!("a redirect already exists for this session, use `redirect edit`");
            }
            form.set_redirect_to(redirect_to);
            form.set_video_link(video_link.unwrap_or_default());
            save(&mut form, &mut parent).await?;
        }
        RedirectCommand::Edit {
            key,
            redirect_to,
            video_link,
            start_minutes,
        } => {
            let mut form =
                open_form(&api, FormVariant::SessionRedirect, Some(key.clone().into())).await?;
            if !form.is_edit_mode() {
                bail!("no redirect exists for '{key}'");
            }
            if let Some(v) = redirect_to {
                form.set_redirect_to(v);
            }
            if let Some(v) = video_link {
                form.set_video_link(v);
            }
            if let Some(v) = start_minutes {
                form.set_start_redirecting_minutes(v);
            }
            save(&mut form, &mut parent).await?;
        }
        RedirectCommand::Stats { key } => {
            let mut form =
                open_form(&api, FormVariant::SessionRedirect, Some(key.clone().into())).await?;
            if !form.is_edit_mode() {
                bail!("no redirect exists for '{key}'");
            }
            form.toggle_stats().await;
            println!("{}", output::markers_list(form.markers().unwrap_or_default()));
        }
    }
    Ok(())
}

async fn nodes(api: Arc<dyn ConsoleApi>, command: NodesCommand) -> Result<()> {
    let user = require_access(api.as_ref()).await?;
    let mut view = NodesView::new(api, Some(user));

    match command {
        NodesCommand::List { sort } => {
            if !sort.is_empty() {
                view.set_sorting(parse_sort_rules(&sort)?);
            }
            view.reload().await;
            println!("{}", output::nodes_table(&view.rows()));
            Ok(())
        }
        NodesCommand::Add { domain } => {
            let mut form = view.open_add_domain();
            form.set_domain(domain);
            if !form.can_submit() {
                bail!("'{}' is not a valid domain name", form.domain());
            }
            if !form.submit(&mut view).await {
                bail!("adding domain '{}' failed", form.domain());
            }
            println!("added {}; {} nodes listed", form.domain(), view.source().len());
            Ok(())
        }
        NodesCommand::Delete { keys } => {
            view.selection_mut()
                .select_all(keys.into_iter().map(NodeKey::from));
            let outcome = view.delete_selected().await;
            report("deleted", outcome)
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
