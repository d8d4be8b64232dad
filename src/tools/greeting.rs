//! Friendly demo tools.

use super::blocking;
use crate::mcp::registry::Registry;
use crate::mcp::schema::Signature;
use crate::mcp::tools::ParamKind;
use serde_json::json;

const SAY_HELLO: &str = "
Say hello to someone.

Args:
    name: The name to greet (default: \"World\")

Returns:
    A friendly greeting message
";

const SAY_GOODBYE: &str = "
Say goodbye to someone.

Args:
    name: The name to say goodbye to (default: \"Friend\")

Returns:
    A friendly goodbye message
";

const GET_GREETING_INFO: &str = "
Get information about available greeting tools.

Returns:
    A dictionary with greeting tool information
";

pub fn register(registry: &mut Registry) {
    registry.register(blocking(
        "say_hello",
        SAY_HELLO,
        Signature::new().optional("name", ParamKind::String, json!("World")),
        |args| Ok(json!(format!("Hello, {}! 👋", args.str("name")?))),
    ));
    registry.register(blocking(
        "say_goodbye",
        SAY_GOODBYE,
        Signature::new().optional("name", ParamKind::String, json!("Friend")),
        |args| Ok(json!(format!("Goodbye, {}! See you later! 👋", args.str("name")?))),
    ));
    registry.register(blocking(
        "get_greeting_info",
        GET_GREETING_INFO,
        Signature::new(),
        |_| {
            Ok(json!({
                "available_tools": ["say_hello", "say_goodbye", "get_greeting_info"],
                "description": "Simple greeting tools for friendly interactions",
                "version": "1.0.0"
            }))
        },
    ));
}
