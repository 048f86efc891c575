//! CLI mode for mtdl - crawl a vendor catalogue and download what is missing.

mod args;
mod progress;

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use console::{Color, Term, style};

use crate::catalog::{CatalogSource, FetchedCatalog};
use crate::credentials::{Prompter, resolve_credentials};
use crate::download::{Downloader, NoProgress};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::inventory::{Inventory, candidate_dirs};
use crate::{AppConfig, DownloadConfig, HttpClient, HttpConfig, RequestProfile, diff};

pub use args::{Cli, CommonArgs, Settings, Vendor, VendorCommand};
use progress::{
    ConsoleProgress, print_overview, print_panel, print_remaining, print_results, print_session,
    print_work_list,
};

/// Prompts on the controlling terminal.
struct TermPrompter {
    term: Term,
}

impl Prompter for TermPrompter {
    fn is_interactive(&self) -> bool {
        self.term.is_term() && std::io::stdin().is_terminal()
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.term.write_str(message).ok()?;
        self.term.read_line().ok()
    }
}

/// Writes the raw index HTML for troubleshooting. Failure is reported only.
async fn dump_index(path: &Path, html: &str) {
    let fs = TokioFileSystem::new();
    let result: std::io::Result<()> = async {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs.create_dir_all(parent).await?;
        }
        tokio::fs::write(path, html).await
    }
    .await;

    match result {
        Ok(()) => print_panel(
            "Index Dump",
            &format!("Saved fetched HTML to {}.", style(path.display()).italic()),
            Color::Cyan,
        ),
        Err(e) => print_panel(
            "Index Dump Error",
            &format!("Failed to write index dump:\n{}", style(e).red()),
            Color::Red,
        ),
    }
}

/// Notice for a catalogue that produced no entries.
fn empty_catalog_notice(vendor: Vendor, fetched: &FetchedCatalog) -> &'static str {
    if fetched.pages_listed == Some(0) {
        vendor.nothing_listed()
    } else {
        vendor.nothing_found()
    }
}

/// Runs one vendor pipeline end to end, prompting on the terminal.
///
/// # Errors
///
/// Returns an error for failures that end the run before any download starts:
/// an unreadable cookie file, a forbidden header value or an unwritable
/// target directory.
pub async fn execute(settings: Settings) -> crate::Result<ExitCode> {
    let prompter = TermPrompter {
        term: Term::stdout(),
    };
    execute_with(settings, &prompter).await
}

async fn execute_with(
    settings: Settings,
    prompter: &(dyn Prompter + Sync),
) -> crate::Result<ExitCode> {
    let fs = TokioFileSystem::new();
    fs.create_dir_all(&settings.target_dir).await?;

    let credentials = resolve_credentials(settings.credentials.clone(), prompter)?;
    let profile = RequestProfile::new(&credentials.user_agent, credentials.cookie.as_deref())?;
    let client = HttpClient::new(profile, HttpConfig::default())?;

    let vendor = settings.vendor;
    let source = vendor.source(settings.index_url.clone());
    log::info!("Crawling {} at {}", source.name(), source.index_url());

    let fetched = match source.fetch(&client).await {
        Ok(fetched) => fetched,
        Err(e) => {
            print_panel(
                "Error",
                &format!("Failed to load index page:\n{}", style(e).red()),
                Color::Red,
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    if let (Some(path), Some(html)) = (&settings.dump_index, &fetched.raw_index) {
        dump_index(path, html).await;
    }

    for warning in &fetched.warnings {
        print_panel(
            "Warning",
            &format!(
                "Skipping session due to missing download link:\n{}\nReason: {}",
                style(&warning.page).red(),
                warning.reason
            ),
            Color::Yellow,
        );
    }

    if fetched.catalog.is_empty() {
        print_panel(
            "No Downloads Found",
            empty_catalog_notice(vendor, &fetched),
            Color::Red,
        );
        return Ok(ExitCode::FAILURE);
    }

    let inventory = Inventory::scan(&fs, &candidate_dirs(&settings.target_dir)).await;
    let plan = diff::plan(&fetched.catalog, &inventory, settings.overwrite);

    print_overview(vendor.name(), &plan, &settings.target_dir);
    print_remaining(plan.missing);

    if plan.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    print_work_list(vendor.work_list_title(), &plan.to_process);

    if settings.dry_run {
        print_panel(
            "Dry Run",
            "Dry run enabled, no files will be downloaded.",
            Color::Yellow,
        );
        return Ok(ExitCode::SUCCESS);
    }

    if settings.overwrite {
        print_panel(
            "Overwrite",
            "Overwrite mode active, existing files will be replaced.",
            Color::Magenta,
        );
    }

    let config = DownloadConfig::new()
        .with_delay(settings.delay)
        .with_force_overwrite(settings.overwrite);
    let downloader = Downloader::new(client, config);
    let report = if Term::stdout().is_term() {
        let progress = ConsoleProgress::new();
        downloader
            .download_all(&plan.to_process, &settings.target_dir, &progress)
            .await
    } else {
        downloader
            .download_all(&plan.to_process, &settings.target_dir, &NoProgress)
            .await
    };

    print_results(&report);
    print_session(&report);
    print_remaining(report.failed_count());

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Entry point for the `mtdl` binary.
pub async fn run(cli: Cli) -> ExitCode {
    let outcome: crate::Result<ExitCode> = async {
        let config = AppConfig::load()?;
        let settings = Settings::resolve(cli.command, &config)?;
        execute(settings).await
    }
    .await;

    outcome.unwrap_or_else(|e| {
        log::error!("{e}");
        print_panel("Error", &style(&e).red().to_string(), Color::Red);
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use mockito::{Mock, ServerGuard};
    use tempfile::TempDir;
    use url::Url;

    use crate::catalog::Catalog;
    use crate::credentials::{CredentialSources, NonInteractive};

    fn full_multitrack(href: &str) -> String {
        format!(
            r#"<div class="m-mtk-download">
                 <span class="m-mtk-download__type">Full Multitrack</span>
                 <div class="m-mtk-download__links"><a href="{href}">ZIP</a></div>
               </div>"#
        )
    }

    fn settings(server: &ServerGuard, target_dir: PathBuf) -> Settings {
        Settings {
            vendor: Vendor::Cambridge,
            index_url: Url::parse(&format!("{}/mtk/", server.url())).unwrap(),
            target_dir,
            delay: Duration::ZERO,
            dry_run: false,
            overwrite: false,
            dump_index: None,
            credentials: CredentialSources {
                default_user_agent: "test-agent".to_string(),
                ..CredentialSources::default()
            },
        }
    }

    async fn serve_index(server: &mut ServerGuard, body: &str) -> Mock {
        server
            .mock("GET", "/mtk/")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    async fn serve_archive(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
        server
            .mock("GET", path)
            .with_status(status)
            .with_body("archive bytes")
            .create_async()
            .await
    }

    async fn exit_code(settings: Settings) -> ExitCode {
        execute_with(settings, &NonInteractive).await.unwrap()
    }

    #[tokio::test]
    async fn one_failed_item_fails_the_run() {
        let mut server = mockito::Server::new_async().await;
        let index = ["/files/A.zip", "/files/B.zip", "/files/C.zip"]
            .map(full_multitrack)
            .concat();
        let _index = serve_index(&mut server, &index).await;
        let _a = serve_archive(&mut server, "/files/A.zip", 200).await;
        let _b = serve_archive(&mut server, "/files/B.zip", 500).await;
        let _c = serve_archive(&mut server, "/files/C.zip", 404).await;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("library");
        let code = exit_code(settings(&server, target.clone())).await;

        assert_eq!(code, ExitCode::FAILURE);
        assert!(target.join("A.zip").is_file());
        assert!(!target.join("B.zip").exists());
        assert!(!target.join("C.zip").exists());
    }

    #[tokio::test]
    async fn all_downloaded_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, &full_multitrack("/files/A.zip")).await;
        let archive = serve_archive(&mut server, "/files/A.zip", 200).await;

        let dir = TempDir::new().unwrap();
        let code = exit_code(settings(&server, dir.path().join("library"))).await;

        archive.assert_async().await;
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn challenge_page_stops_before_any_download() {
        let mut server = mockito::Server::new_async().await;
        let page = format!(
            "<title>Just a moment</title> Verifying you are human {}",
            full_multitrack("/files/A.zip")
        );
        let _index = serve_index(&mut server, &page).await;
        let archive = server
            .mock("GET", "/files/A.zip")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let code = exit_code(settings(&server, dir.path().join("library"))).await;

        assert_eq!(code, ExitCode::FAILURE);
        archive.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_on_index_fails_the_run() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/mtk/")
            .with_status(503)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let code = exit_code(settings(&server, dir.path().join("library"))).await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn unwritable_dump_keeps_success() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, &full_multitrack("/files/A.zip")).await;
        let _archive = serve_archive(&mut server, "/files/A.zip", 200).await;

        let dir = TempDir::new().unwrap();
        let blocker = TempDir::new().unwrap();
        let not_a_dir = blocker.path().join("plain-file");
        std::fs::write(&not_a_dir, "x").unwrap();

        let mut settings = settings(&server, dir.path().join("library"));
        settings.dump_index = Some(not_a_dir.join("index.html"));
        let code = exit_code(settings).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join("library").join("A.zip").is_file());
    }

    #[tokio::test]
    async fn dump_is_written_even_when_nothing_is_found() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, "<p>nothing here</p>").await;

        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dumps").join("index.html");
        let mut settings = settings(&server, dir.path().join("library"));
        settings.dump_index = Some(dump.clone());
        exit_code(settings).await;

        assert_eq!(std::fs::read_to_string(dump).unwrap(), "<p>nothing here</p>");
    }

    #[tokio::test]
    async fn empty_catalogue_fails_the_run() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, "<p>No multitracks today</p>").await;

        let dir = TempDir::new().unwrap();
        let code = exit_code(settings(&server, dir.path().join("library"))).await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn dry_run_downloads_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, &full_multitrack("/files/A.zip")).await;
        let archive = server
            .mock("GET", "/files/A.zip")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("library");
        let mut settings = settings(&server, target.clone());
        settings.dry_run = true;
        let code = exit_code(settings).await;

        assert_eq!(code, ExitCode::SUCCESS);
        archive.assert_async().await;
        assert!(target.is_dir());
        assert!(!target.join("A.zip").exists());
    }

    #[tokio::test]
    async fn nothing_missing_is_a_no_op() {
        let mut server = mockito::Server::new_async().await;
        let _index = serve_index(&mut server, &full_multitrack("/files/A.zip")).await;
        let archive = server
            .mock("GET", "/files/A.zip")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("library");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("a.ZIP"), "already here").unwrap();

        let code = exit_code(settings(&server, target)).await;

        assert_eq!(code, ExitCode::SUCCESS);
        archive.assert_async().await;
    }

    #[test]
    fn empty_listing_gets_its_own_notice() {
        let index = Url::parse("https://t.example.com/multitracks/").unwrap();
        let fetched = |pages_listed| FetchedCatalog {
            catalog: Catalog::new(index.clone()),
            warnings: Vec::new(),
            raw_index: None,
            pages_listed,
        };

        assert_eq!(
            empty_catalog_notice(Vendor::Telefunken, &fetched(Some(0))),
            "No session links found on the TELEFUNKEN catalogue page."
        );
        assert_eq!(
            empty_catalog_notice(Vendor::Telefunken, &fetched(Some(3))),
            Vendor::Telefunken.nothing_found()
        );
        assert_eq!(
            empty_catalog_notice(Vendor::Cambridge, &fetched(None)),
            Vendor::Cambridge.nothing_found()
        );
    }
}
