// OpenAI driver for the agent loop.
//
// Implements `LlmDriver` over the chat completions endpoint with function
// calling. Non-streaming: the loop consumes whole responses.

pub mod driver;
pub mod types;

pub use driver::OpenAiDriver;
