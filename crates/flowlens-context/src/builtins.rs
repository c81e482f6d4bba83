//! Built-in context tables.
//!
//! Field sets mirror the documented `github` and `runner` contexts and the
//! default environment variables GitHub injects into every runner.

/// Top-level namespaces offered when completing inside empty `${{ }}`.
pub const NAMESPACE_ROOTS: &[(&str, &str)] = &[
    ("env", "Environment variables from the workflow, job, and step levels"),
    ("github", "Information about the workflow run and the triggering event"),
    ("inputs", "Workflow inputs from workflow_dispatch or workflow_call"),
    ("jobs", "Outputs of jobs, for reusable workflow outputs"),
    ("needs", "Outputs and results of the jobs this job depends on"),
    ("runner", "Information about the runner executing the job"),
    ("secrets", "Secrets available to the workflow"),
    ("steps", "Steps with an id in the current job"),
    ("vars", "Configuration variables set at the organization, repository, or environment level"),
];

/// Fields of the `github` context.
pub const GITHUB_CONTEXT: &[(&str, &str)] = &[
    ("action", "The name of the action currently running, or the id of a step"),
    ("action_path", "The path where an action is located; composite actions only"),
    ("action_ref", "For a step executing an action, the ref of the action being executed"),
    ("action_repository", "For a step executing an action, the owner and repository name of the action"),
    ("action_status", "For a composite action, the current result of the composite action"),
    ("actor", "The username of the user that triggered the initial workflow run"),
    ("actor_id", "The account ID of the person or app that triggered the initial workflow run"),
    ("api_url", "The URL of the GitHub REST API"),
    ("base_ref", "The base_ref or target branch of the pull request in a workflow run"),
    ("env", "Path on the runner to the file that sets environment variables from workflow commands"),
    ("event", "The full event webhook payload"),
    ("event_name", "The name of the event that triggered the workflow run"),
    ("event_path", "The path to the file on the runner that contains the full event webhook payload"),
    ("graphql_url", "The URL of the GitHub GraphQL API"),
    ("head_ref", "The head_ref or source branch of the pull request in a workflow run"),
    ("job", "The job_id of the current job"),
    ("job_workflow_sha", "For jobs using a reusable workflow, the commit SHA of the reusable workflow file"),
    ("path", "Path on the runner to the file that sets system PATH variables from workflow commands"),
    ("ref", "The fully-formed ref of the branch or tag that triggered the workflow run"),
    ("ref_name", "The short ref name of the branch or tag that triggered the workflow run"),
    ("ref_protected", "true if branch protections are configured for the ref that triggered the workflow run"),
    ("ref_type", "The type of ref that triggered the workflow run, branch or tag"),
    ("repository", "The owner and repository name, for example octocat/Hello-World"),
    ("repository_id", "The ID of the repository"),
    ("repository_owner", "The repository owner's username"),
    ("repository_owner_id", "The repository owner's account ID"),
    ("repositoryUrl", "The Git URL to the repository"),
    ("retention_days", "The number of days that workflow run logs and artifacts are kept"),
    ("run_id", "A unique number for each workflow run within a repository"),
    ("run_number", "A unique number for each run of a particular workflow in a repository"),
    ("run_attempt", "A unique number for each attempt of a particular workflow run in a repository"),
    ("secret_source", "The source of a secret used in a workflow"),
    ("server_url", "The URL of the GitHub server"),
    ("sha", "The commit SHA that triggered the workflow"),
    ("token", "A token to authenticate on behalf of the GitHub App installed on the repository"),
    ("triggering_actor", "The username of the user that initiated the workflow run"),
    ("workflow", "The name of the workflow"),
    ("workflow_ref", "The ref path to the workflow"),
    ("workflow_sha", "The commit SHA of the workflow file"),
    ("workspace", "The default working directory on the runner for steps"),
];

/// Fields of the `runner` context.
pub const RUNNER_CONTEXT: &[(&str, &str)] = &[
    ("name", "The name of the runner executing the job"),
    ("os", "The operating system of the runner, Linux, Windows, or macOS"),
    ("arch", "The architecture of the runner, X86, X64, ARM, or ARM64"),
    ("temp", "The path to a temporary directory on the runner"),
    ("tool_cache", "The path to the directory containing preinstalled tools"),
    ("debug", "Set to 1 when debug logging is enabled"),
];

/// Environment variables GitHub sets on every runner.
pub const DEFAULT_ENVS: &[(&str, &str)] = &[
    ("CI", "Always set to true"),
    ("GITHUB_ACTION", "The name of the action currently running, or the id of a step"),
    ("GITHUB_ACTION_PATH", "The path where an action is located; composite actions only"),
    ("GITHUB_ACTION_REPOSITORY", "For a step executing an action, the owner and repository name of the action"),
    ("GITHUB_ACTIONS", "Always set to true when GitHub Actions is running the workflow"),
    ("GITHUB_ACTOR", "The name of the person or app that initiated the workflow"),
    ("GITHUB_ACTOR_ID", "The account ID of the person or app that triggered the initial workflow run"),
    ("GITHUB_API_URL", "The API URL"),
    ("GITHUB_BASE_REF", "The name of the base ref or target branch of the pull request"),
    ("GITHUB_ENV", "The path to the file that sets variables from workflow commands"),
    ("GITHUB_EVENT_NAME", "The name of the event that triggered the workflow"),
    ("GITHUB_EVENT_PATH", "The path to the file containing the full event webhook payload"),
    ("GITHUB_GRAPHQL_URL", "The GraphQL API URL"),
    ("GITHUB_HEAD_REF", "The head ref or source branch of the pull request"),
    ("GITHUB_JOB", "The job_id of the current job"),
    ("GITHUB_PATH", "The path to the file that sets system PATH variables from workflow commands"),
    ("GITHUB_REF", "The fully-formed ref of the branch or tag that triggered the workflow run"),
    ("GITHUB_REF_NAME", "The short ref name of the branch or tag that triggered the workflow run"),
    ("GITHUB_REF_PROTECTED", "true if branch protections are configured for the triggering ref"),
    ("GITHUB_REF_TYPE", "The type of ref that triggered the workflow run, branch or tag"),
    ("GITHUB_REPOSITORY", "The owner and repository name"),
    ("GITHUB_REPOSITORY_ID", "The ID of the repository"),
    ("GITHUB_REPOSITORY_OWNER", "The repository owner's username"),
    ("GITHUB_RETENTION_DAYS", "The number of days that workflow run logs and artifacts are kept"),
    ("GITHUB_RUN_ATTEMPT", "A unique number for each attempt of a particular workflow run"),
    ("GITHUB_RUN_ID", "A unique number for each workflow run within a repository"),
    ("GITHUB_RUN_NUMBER", "A unique number for each run of a particular workflow in a repository"),
    ("GITHUB_SERVER_URL", "The URL of the GitHub server"),
    ("GITHUB_SHA", "The commit SHA that triggered the workflow"),
    ("GITHUB_STEP_SUMMARY", "The path to the file that contains job summaries from workflow commands"),
    ("GITHUB_WORKFLOW", "The name of the workflow"),
    ("GITHUB_WORKFLOW_REF", "The ref path to the workflow"),
    ("GITHUB_WORKFLOW_SHA", "The commit SHA of the workflow file"),
    ("GITHUB_WORKSPACE", "The default working directory on the runner for steps"),
    ("RUNNER_ARCH", "The architecture of the runner"),
    ("RUNNER_DEBUG", "Set only when debug logging is enabled, always 1"),
    ("RUNNER_NAME", "The name of the runner executing the job"),
    ("RUNNER_OS", "The operating system of the runner"),
    ("RUNNER_TEMP", "The path to a temporary directory on the runner"),
    ("RUNNER_TOOL_CACHE", "The path to the directory containing preinstalled tools"),
];

/// Step result fields usable instead of `outputs` in `steps.<id>.<field>`.
pub const STEP_RESULT_FIELDS: &[(&str, &str)] = &[
    ("conclusion", "The result of a completed step after continue-on-error is applied"),
    ("outcome", "The result of a completed step before continue-on-error is applied"),
];
