// Prompt templates for the field matcher.

/// System prompt for form-field matching.
pub const FORM_MATCH_SYSTEM: &str = "\
You fill job application forms on behalf of a candidate. \
Given the form fields on a page and the candidate's stored data, decide which field \
receives which value. \
You MUST respond with a JSON array only, with no markdown fences, no explanations. \
Leave out any field you cannot fill confidently; never emit an empty value.";

/// Matching prompt template. Replace `{fields}` and `{profile}` before sending.
pub const FORM_MATCH_PROMPT_TEMPLATE: &str = r#"Match the form fields below to the candidate data.

FORM FIELDS (id, name, type):
{fields}

CANDIDATE DATA:
{profile}

OUTPUT FORMAT (return exactly this structure):
[
  {"selector": "<field id from FORM FIELDS>", "value": "<value to enter>"}
]

EXAMPLE:
Fields: [{"id": "fname", "name": "first_name", "type": "text"}, {"id": "mail", "name": "email", "type": "email"}, {"id": "field-4", "name": "", "type": "text"}]
Candidate: {"personal_information": {"first_name": "Ada", "email": "ada@example.com"}}
Output: [{"selector": "fname", "value": "Ada"}, {"selector": "mail", "value": "ada@example.com"}]

RULES:
1. "selector" must be copied exactly from a field's "id".
2. At most one entry per field.
3. For select fields, use the visible option text.
4. Skip fields of type "file", "submit", "button", "hidden" and "password".
5. Return ONLY the JSON array and nothing else, no code fences."#;
