//! The per-job pipeline: stages F (workspace) through K (publish), run
//! once per claimed `Review`. Every stage after cloning borrows a
//! `Worktree` guard whose `Drop` removes the checkout on every exit path
//! — early return, error, or panic unwind alike.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Duration as ChronoDuration;
use review_analyzer::{AnalyzerConfig, ForgeCredentials, PrConfig, ProviderCredentials, RepositoryConfig};
use review_cache::InMemoryFindingCache;
use review_config::{AiProvider, Config};
use review_diff::ValidLineSet;
use review_forge::ForgeClient;
use review_metrics::{Metrics, ReviewOutcome};
use review_postprocess::{AggregatedReview, PostprocessInput};
use review_store::Store;
use review_types::{Finding, Organization, Repository, Review, Severity};
use review_workspace::Workspace;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::PipelineError;
use crate::forge_resolver::ForgeResolver;

/// Everything a pipeline run needs, bundled so `run` takes one argument
/// instead of eight. Cheap to construct per job: every field is a
/// reference into state the worker pool already owns for its whole
/// lifetime.
pub struct PipelineContext<'a> {
    pub config: &'a Config,
    pub store: &'a Store,
    pub workspace: &'a Workspace,
    pub cache: &'a InMemoryFindingCache,
    pub metrics: &'a Metrics,
    pub forge: &'a ForgeResolver,
    pub http: &'a reqwest::Client,
}

/// Derives the git remote to clone. Repositories don't carry a dedicated
/// column for this (spec.md's schema has no such field); `config` is the
/// free-form per-repo JSON blob every `Repository` already has, so an
/// operator-supplied override lives at `config.clone_url` and everything
/// else falls back to the forge's default HTTPS remote shape.
fn clone_url_for(repo: &Repository) -> String {
    if let Some(url) = repo.config.get("clone_url").and_then(|v| v.as_str()) {
        return url.to_string();
    }
    match repo.platform {
        review_types::Platform::GitHub => format!("https://github.com/{}.git", repo.full_name),
        review_types::Platform::GitLab => format!("https://gitlab.com/{}.git", repo.full_name),
        review_types::Platform::Bitbucket => format!("https://bitbucket.org/{}.git", repo.full_name),
    }
}

/// `ListPRFiles`/`CreateReview`/`GetPRAuthor` all take a forge-native
/// repo identifier: `owner/name` everywhere except GitLab, which wants
/// the project path (carried as `external_id`).
fn repo_ident(repo: &Repository) -> &str {
    match repo.platform {
        review_types::Platform::GitLab => &repo.external_id,
        _ => &repo.full_name,
    }
}

fn finding_to_raw(f: Finding) -> review_analyzer::RawFinding {
    let severity = match f.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    };
    review_analyzer::RawFinding {
        file: f.file,
        line: f.line,
        severity: severity.to_string(),
        category: f.category,
        message: f.message,
        fix: f.fix,
    }
}

/// One chunk of diffed code, its fingerprint, and whether it hit the
/// cache — the unit the review cache and analyzer dispatch both key on.
struct Classified {
    chunk: review_diff::Chunk,
    cached: Option<Vec<Finding>>,
}

/// Parses every file's patch, fingerprints every hunk, and classifies
/// each chunk as a cache hit or miss. Binary files contribute no chunks
/// (no postable lines, nothing to fingerprint).
async fn classify_chunks(
    http: &reqwest::Client,
    indexer_url: Option<&str>,
    repo_id: review_types::RepoId,
    cache: &InMemoryFindingCache,
    files: &[review_forge::PrFile],
) -> (Vec<Classified>, HashMap<String, ValidLineSet>) {
    let mut classified = Vec::new();
    let mut valid_lines = HashMap::new();

    for file in files {
        let Some(patch) = file.patch.as_deref() else {
            continue;
        };
        let parsed = review_diff::parse_file_patch(&file.filename, patch);
        if parsed.is_binary {
            continue;
        }
        valid_lines.insert(file.filename.clone(), review_diff::build_valid_line_set(&parsed.hunks));

        for hunk in &parsed.hunks {
            let fingerprint = review_diff::fingerprint_hunk(http, indexer_url, &file.filename, hunk).await;
            let cached = review_cache::get_or_miss(cache, repo_id, &file.filename, &fingerprint);
            classified.push(Classified {
                chunk: review_diff::Chunk { file: file.filename.clone(), hunk: hunk.clone(), fingerprint },
                cached,
            });
        }
    }

    (classified, valid_lines)
}

fn build_analyzer_config(config: &Config, repo: &Repository, review: &Review, forge_token: Option<&str>) -> AnalyzerConfig {
    let (ai_provider, openai, claude) = match config.ai_provider {
        AiProvider::OpenAi => (
            "openai".to_string(),
            config.openai_api_key.as_ref().map(|k| ProviderCredentials { api_key: k.clone(), model: None }),
            None,
        ),
        AiProvider::Claude => (
            "claude".to_string(),
            None,
            config.claude_api_key.as_ref().map(|k| ProviderCredentials { api_key: k.clone(), model: None }),
        ),
    };

    let (github, gitlab) = match (repo.platform, forge_token) {
        (review_types::Platform::GitHub, Some(t)) => (Some(ForgeCredentials { token: t.to_string() }), None),
        (review_types::Platform::GitLab, Some(t)) => (None, Some(ForgeCredentials { token: t.to_string() })),
        _ => (None, None),
    };

    AnalyzerConfig {
        ai_provider,
        openai,
        claude,
        global_rules: Vec::new(),
        repository: RepositoryConfig { full_name: repo.full_name.clone(), is_private: repo.is_private },
        pr: PrConfig { number: review.pr_number, head_sha: review.head_sha.clone(), base_branch: review.base_branch.clone() },
        github,
        gitlab,
    }
}

pub struct PipelineOutcome {
    pub review: AggregatedReview,
}

/// Runs stages F through K for one claimed review. Returns
/// `PipelineError` for the caller to classify as retryable or not; never
/// panics on a missing Repository/Organization row — those are treated
/// as permanent data-integrity failures (`StoreError::NotFound`, not
/// retryable).
#[instrument(skip_all, fields(review_id = %review.id, pr = review.pr_number))]
pub async fn run(ctx: &PipelineContext<'_>, review: &Review, repo: &Repository, org: &Organization) -> Result<PipelineOutcome, PipelineError> {
    let started = Instant::now();

    let forge = ctx.forge.resolve(repo.platform, org.installation_id).await?;
    let ident = repo_ident(repo);

    let clone_url = clone_url_for(repo);
    let repo_handle = ctx.workspace.clone_or_reuse(&clone_url).await?;
    let worktree = ctx.workspace.new_worktree(&repo_handle, &review.head_sha).await?;

    let pr_files = forge.list_pr_files(ident, review.pr_number).await?;
    let pr_file_names: Vec<String> = pr_files.iter().map(|f| f.filename.clone()).collect();

    let (classified, valid_lines) =
        classify_chunks(ctx.http, ctx.config.rust_indexer_url.as_deref(), repo.id, ctx.cache, &pr_files).await;

    let cache_hits = classified.iter().filter(|c| c.cached.is_some()).count() as u64;
    let cache_misses = classified.len() as u64 - cache_hits;

    let cached_findings: Vec<review_analyzer::RawFinding> =
        classified.iter().filter_map(|c| c.cached.clone()).flatten().map(finding_to_raw).collect();

    let fresh_chunks: Vec<review_diff::Chunk> = classified.iter().filter(|c| c.cached.is_none()).map(|c| c.chunk.clone()).collect();

    // All chunks satisfied from cache: the analyzer isn't invoked at all
    // (the cheapest possible "incremental" run). The analyzer's CLI
    // contract reviews the whole worktree in one shot — there is no
    // partial-diff invocation to ask for — so a partial cache hit still
    // means one full invocation, with cached lines deduped against the
    // analyzer's output by `review-postprocess`'s fingerprint-keyed
    // write-back. See DESIGN.md for the rationale.
    let fresh_findings: Vec<review_analyzer::RawFinding> = if fresh_chunks.is_empty() {
        Vec::new()
    } else {
        let forge_token = match &forge {
            ForgeClient::GitHub(_) => None, // installation tokens aren't embedded in AnalyzerConfig; GitHub calls route through the forge client, not the analyzer subprocess.
            ForgeClient::GitLab(_) => ctx.config.gitlab_token.as_deref(),
            ForgeClient::Bitbucket(_) => None,
        };
        let analyzer_config = build_analyzer_config(ctx.config, repo, review, forge_token);
        let config_dir = worktree.path.parent().unwrap_or(&worktree.path).join("analyzer-config");
        let scoped = review_analyzer::write_scoped_config(&config_dir, &analyzer_config).await?;
        info!(config = ?analyzer_config.redacted(), "invoking analyzer");

        let timeout = Duration::from_millis(ctx.config.review_timeout_ms);
        let output =
            review_analyzer::run_analyzer(&ctx.config.analyzer_bin, &scoped.path, &worktree.path, &review.head_sha, &review.base_branch, timeout)
                .await?;
        output.comments
    };

    let postprocessed = review_postprocess::process(
        PostprocessInput {
            org_id: org.id,
            repo_id: repo.id,
            pr_files: &pr_file_names,
            valid_lines: &valid_lines,
            cached_findings,
            fresh_chunks: &fresh_chunks,
            fresh_findings,
            cache_ttl: ChronoDuration::hours(ctx.config.review_cache_ttl_hours as i64),
            suppression_threshold: review_postprocess::suppress::DEFAULT_SUPPRESSION_THRESHOLD,
            learning_window_days: review_postprocess::suppress::DEFAULT_LEARNING_WINDOW_DAYS,
        },
        ctx.cache,
        &ctx.store.feedback,
    )
    .await;

    // Pre-publish staleness guard (spec.md §5/§8 scenario 2): a newer
    // trigger for this (repo_id, pr_number) may have superseded this
    // review (`review-api::webhooks::route::admit_and_enqueue`) while this
    // pipeline was running. That flips this row out of `Processing`
    // without this task's involvement, so re-reading it here is the only
    // way to notice. Abort before ever calling the forge: the superseding
    // review owns the one atomic publish for this PR, not this one.
    match ctx.store.reviews.get(review.id).await? {
        Some(current) if current.status == review_types::ReviewStatus::Processing => {}
        _ => return Err(PipelineError::Superseded),
    }

    let author = forge.get_pr_author(ident, review.pr_number).await?;
    let submission = review_publisher::build_submission(review.head_sha.clone(), &postprocessed);
    review_publisher::publish(&forge, ident, review.pr_number, &author, submission).await?;

    let duration_ms = started.elapsed().as_millis() as u64;
    let incremental = cache_hits > 0;
    ctx.metrics.record(ReviewOutcome { success: true, cache_hits, cache_misses, incremental, duration_ms });

    let result = json!({
        "recommendation": format!("{:?}", postprocessed.recommendation()),
        "errors": postprocessed.errors,
        "warnings": postprocessed.warnings,
        "info": postprocessed.info,
        "cache_hits": cache_hits,
        "cache_misses": cache_misses,
    });
    ctx.store.reviews.mark_completed(review.id, result, duration_ms).await?;

    Ok(PipelineOutcome { review: postprocessed })
}

/// Records a failed run's metrics and marks the Review row failed. Split
/// out from `run` so the worker pool can call it uniformly regardless of
/// which stage produced the error (including timeout/cancellation, which
/// never reach the end of `run` at all).
pub async fn record_failure(ctx: &PipelineContext<'_>, review: &Review, error: &PipelineError, duration_ms: u64) {
    warn!(review_id = %review.id, error = %error, "review failed");
    ctx.metrics.record(ReviewOutcome { success: false, cache_hits: 0, cache_misses: 0, incremental: false, duration_ms });
    if let Err(e) = ctx.store.reviews.mark_failed(review.id, error.to_string()).await {
        warn!(review_id = %review.id, error = %e, "failed to persist failure state");
    }
}
