//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Parley Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# API keys are read from OPENAI_API_KEY, GEMINI_API_KEY and ANTHROPIC_API_KEY
# (a .env file in the working directory is honored).

[providers]
# preference = ["gemini", "openai", "anthropic"]  # first backend with a key wins
# request_timeout_secs = 60   # 1-600
# connect_timeout_secs = 10   # 1-120
# max_retries = 2             # 0-10, transient failures only
# retry_backoff_ms = 500      # 0-60000, doubled per attempt

[providers.openai]
# model = "gpt-4o-mini"
# base_url = "https://api.openai.com/v1"
# max_tokens = 1024           # 1-200000
# temperature = 0.7           # 0.0-2.0

[providers.gemini]
# model = "gemini-2.5-flash"
# base_url = "https://generativelanguage.googleapis.com/v1beta"
# max_tokens = 1024
# temperature = 0.7

[providers.anthropic]
# model = "claude-sonnet-4-20250514"
# base_url = "https://api.anthropic.com/v1"
# max_tokens = 1024
# temperature = 0.7

[orchestrator]
# fallback_text = "I apologize, but I couldn't generate a proper response."
# tool_timeout_secs = 30      # 0 disables the per-tool deadline
# parallel_tool_calls = false
# system_prompt = "You are a helpful assistant that can search for users."

[directory]
# base_url = ""               # empty uses the bundled demo users
# timeout_secs = 10           # 1-300

[logging]
# level = "info"              # trace, debug, info, warn, error
"##
}
