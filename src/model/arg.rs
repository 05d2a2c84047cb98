use clap::Parser;

/// Terminal client for a streaming chat backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Credentials file path (JSON with accessToken, written by the sign-in tool)
    #[arg(long)]
    pub credentials: Option<String>,

    /// Conversation ID, overrides the config file
    #[arg(long)]
    pub conversation: Option<String>,

    /// Use the non-streaming endpoint
    #[arg(long)]
    pub no_stream: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    pub write_config: bool,

    /// Prompt to send; reads prompts from stdin when omitted
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "kurious-chat",
            "--config",
            "c.json",
            "--conversation",
            "work",
            "--no-stream",
            "hello there",
        ]);
        assert_eq!(args.config.as_deref(), Some("c.json"));
        assert_eq!(args.conversation.as_deref(), Some("work"));
        assert!(args.no_stream);
        assert!(!args.write_config);
        assert_eq!(args.prompt.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_interactive_without_prompt() {
        let args = Args::parse_from(["kurious-chat"]);
        assert!(args.prompt.is_none());
        assert!(args.credentials.is_none());
    }
}
