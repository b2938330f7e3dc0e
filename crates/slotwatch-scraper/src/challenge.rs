//! Interstitial challenge resolution.
//!
//! The appointment site answers the initial POST with a challenge page: a
//! hidden form plus an embedded script that computes or unscrambles the form's
//! field values. The server only accepts the real query once those values are
//! submitted back, so the pipeline has to actually run the script.
//!
//! Execution happens inside an embedded JS engine ([`boa_engine`]) seeded with
//! a minimal `document` shim built from the parsed page. Only the page's
//! inline scripts and the `challenge();` invocation are evaluated — the shim
//! exposes no host capabilities, so page code cannot reach the process.

use boa_engine::{Context, JsValue, Source};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;

use crate::error::ChallengeError;

/// Execution budget. Challenge scripts are tiny; anything that trips these
/// limits is treated as a failed challenge, not retried.
const LOOP_ITERATION_LIMIT: u64 = 1_000_000;
const RECURSION_LIMIT: usize = 512;

const CHALLENGE_INVOCATION: &str = "challenge();";

/// Reads the (possibly script-rewritten) form back out of the shim.
const HARVEST_SCRIPT: &str = r"
JSON.stringify(document.forms[0].elements
  .filter(function (el) { return el.name; })
  .map(function (el) { return { name: el.name, value: String(el.value) }; }))
";

#[derive(Debug, Deserialize)]
struct HarvestedField {
    name: String,
    value: String,
}

#[derive(Debug)]
struct FormInput {
    name: String,
    id: String,
    value: String,
}

/// Executes the challenge page's `challenge()` invocation and returns every
/// named input of the document's first form as an ordered name/value mapping.
///
/// # Errors
///
/// - [`ChallengeError::NoForm`] — the page carries no `<form>` element.
/// - [`ChallengeError::Script`] — an inline script or the challenge invocation
///   threw, or the execution budget was exceeded.
/// - [`ChallengeError::Harvest`] — the form could not be read back after
///   execution.
pub fn run_challenge(html: &str) -> Result<Vec<(String, String)>, ChallengeError> {
    let document = Html::parse_document(html);
    let inputs = first_form_inputs(&document)?;
    let scripts = inline_scripts(&document);

    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
    context.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

    eval(&mut context, &document_shim(&inputs))?;
    for script in &scripts {
        eval(&mut context, script)?;
    }
    eval(&mut context, CHALLENGE_INVOCATION)?;

    harvest(&mut context)
}

fn eval(context: &mut Context, src: &str) -> Result<JsValue, ChallengeError> {
    context
        .eval(Source::from_bytes(src))
        .map_err(|e| ChallengeError::Script {
            message: e.to_string(),
        })
}

/// Collects the first form's `<input>` elements in document order.
fn first_form_inputs(document: &Html) -> Result<Vec<FormInput>, ChallengeError> {
    let form_selector = Selector::parse("form").expect("valid form selector");
    let input_selector = Selector::parse("input").expect("valid input selector");

    let form = document
        .select(&form_selector)
        .next()
        .ok_or(ChallengeError::NoForm)?;

    Ok(form
        .select(&input_selector)
        .map(|input| FormInput {
            name: input.value().attr("name").unwrap_or_default().to_string(),
            id: input.value().attr("id").unwrap_or_default().to_string(),
            value: input.value().attr("value").unwrap_or_default().to_string(),
        })
        .collect())
}

fn inline_scripts(document: &Html) -> Vec<String> {
    let script_selector = Selector::parse("script").expect("valid script selector");
    document
        .select(&script_selector)
        .filter(|el| el.value().attr("src").is_none())
        .map(|el| el.text().collect::<String>())
        .filter(|src| !src.trim().is_empty())
        .collect()
}

/// Builds the `document` shim the challenge script runs against.
///
/// `document.forms[0].elements` is the parsed input list; each named element
/// is also reachable as a property of the form (`form.token`), and
/// `document.getElementById` resolves against the same list. Field data is
/// embedded via JSON so arbitrary attribute content cannot escape into script
/// source.
fn document_shim(inputs: &[FormInput]) -> String {
    let elements = json!(inputs
        .iter()
        .map(|input| json!({ "name": input.name, "id": input.id, "value": input.value }))
        .collect::<Vec<_>>());

    format!(
        r"var document = {{ forms: [{{ elements: {elements} }}] }};
(function () {{
  var form = document.forms[0];
  for (var i = 0; i < form.elements.length; i++) {{
    var el = form.elements[i];
    if (el.name) {{ form[el.name] = el; }}
  }}
  document.getElementById = function (id) {{
    for (var i = 0; i < form.elements.length; i++) {{
      if (form.elements[i].id === id) {{ return form.elements[i]; }}
    }}
    return null;
  }};
}})();
"
    )
}

fn harvest(context: &mut Context) -> Result<Vec<(String, String)>, ChallengeError> {
    let value = eval(context, HARVEST_SCRIPT)?;
    let encoded = value
        .to_string(context)
        .map_err(|e| ChallengeError::Harvest {
            message: e.to_string(),
        })?
        .to_std_string_escaped();

    let fields: Vec<HarvestedField> =
        serde_json::from_str(&encoded).map_err(|e| ChallengeError::Harvest {
            message: e.to_string(),
        })?;

    Ok(fields.into_iter().map(|f| (f.name, f.value)).collect())
}
