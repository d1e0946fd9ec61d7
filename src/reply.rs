use crate::command::Command;
use crate::random_org::SignedResult;

const VERIFY_URL: &str = "https://api.random.org/verify";
const SOURCE_URL: &str = "https://github.com/jjmerri/random-number-bot";

/// Sent when the draw failed because the requested slot count cannot produce
/// a winner. Caller error, so the operator is not involved.
pub const INVALID_SLOTS_MESSAGE: &str =
    "The number of slots must be greater than 1. Please check your command and try again.";

/// Sent when the draw failed for any other reason. Re-issuing the command
/// enters the pipeline as a fresh mention.
pub const RETRY_MESSAGE: &str =
    "There was an error getting your random numbers from random.org. Please try again.";

/// Builds the outward-facing reply for a successful draw: command header,
/// drawn numbers, verification block, and provenance footer.
pub fn compose(command: &Command, result: &SignedResult, maintainer: &str) -> String {
    format!(
        "#{header} {numbers}\n\n\
         Paste the following values into their respective fields on the \
         [random.org verify page]({verify_url}) to verify the winner.\n\n\
         **Random:**\n\n\
         {verification_random}\n\n\
         **Signature:**\n\n\
         {verification_signature}\n\n\
         **This bot is maintained and hosted by {maintainer}. \
         View the {version} source code on [github]({source_url})**",
        header = command.header(),
        numbers = format_numbers(&result.random.data),
        verify_url = VERIFY_URL,
        verification_random = result.random.verification_json(),
        verification_signature = result.signature,
        maintainer = maintainer,
        version = env!("CARGO_PKG_VERSION"),
        source_url = SOURCE_URL,
    )
}

fn format_numbers(data: &[i64]) -> String {
    format!(
        "[{}]",
        data.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}
