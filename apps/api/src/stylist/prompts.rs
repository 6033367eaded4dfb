// Prompt templates for the stylist features.
// The JSON-only system prompt and the language instruction live in llm_client::prompts.

/// System prompt for diagnosis and outfit calls.
pub const STYLIST_SYSTEM: &str = "You are a professional personal stylist and skeletal-frame \
    diagnosis expert. You MUST respond with valid JSON only, matching the declared response schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Photo diagnosis prompt. The photo is attached inline.
pub const DIAGNOSIS_PROMPT: &str = r#"Look at the attached full-body photo and classify the person's skeletal frame as exactly one of "Straight", "Wave" or "Natural".

- Straight: three-dimensional, toned body with a high waist and a thick upper body.
- Wave: soft, curvy body with a thin upper body and a low waist.
- Natural: prominent bone frame with visible joints and broad shoulders.

Return "type" with the category and "reason" with a short explanation of the visual cues you used.

{language_instruction}"#;

/// Weather prompt. Replace `{location}`, `{date}` and `{language_instruction}` before sending.
pub const WEATHER_PROMPT_TEMPLATE: &str = r#"Search for the weather forecast at {location} on {date}.

Return:
- "city": the city name
- "temp": the expected temperature in degrees Celsius (number)
- "condition": a short weather condition such as sunny, cloudy or rain
- "humidity": relative humidity in percent (number)
- "description": one sentence describing how the day will feel

If the exact date is not available, use the closest forecast you can find.

{language_instruction}"#;

/// Outfit prompt. Replace every `{placeholder}` before sending.
pub const OUTFIT_PROMPT_TEMPLATE: &str = r#"Suggest one outfit for a person with the "{body_type}" frame ({styling_focus}).

Conditions:
- Place: {city}
- Date: {date}
- Weather: {condition}, {temp}°C, humidity {humidity}% ({weather_description})
- Mood / plans: {mood}

Return:
- "title": a catchy title for the outfit
- "items": 3 to 5 garments or accessories, each with "name", optional "brandName", "description" and "searchKeyword" (a short query that finds the item in an online shop)
- "tips": styling tips that flatter the frame
- "reason": why this outfit suits both the frame and the weather
- "audioText": a friendly spoken summary of at most three sentences

{language_instruction}"#;

/// Replaces `{key}` placeholders in a single pass over the template, so
/// values are never scanned for further placeholders.
pub fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
