pub mod invoker;
pub mod models;
pub mod parser;
pub mod selector;
pub mod ytdlp;

pub use invoker::{Invocation, ProcessRunner, RunLimits, ToolRunner};
pub use models::{MediaFormat, VideoMetadata};
pub use parser::{parse_output, ToolOutput};
pub use selector::{select_best_format, FormatRequirement};
pub use ytdlp::{find_ytdlp, MediaMode, YtDlpExtractor};
