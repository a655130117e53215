// Cross-cutting prompt fragments. Each module that calls the LLM keeps its
// own prompts.rs next to it and composes these.

/// Appended to every prompt that carries user profile data.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only use values that appear in the provided user data. \
    Do NOT infer, interpolate, or invent details. \
    If the data does not support a value for a field, leave that field out entirely.";
