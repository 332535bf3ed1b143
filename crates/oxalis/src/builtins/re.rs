//! Regular expression primitives.

use regex::Regex;

use crate::{
    callable::Arity,
    env::EnvId,
    error::{EvalError, EvalResult},
    heap::HeapData,
    interp::Interp,
    list,
    types::TypeMask,
    value::Value,
};

pub(crate) fn register(interp: &mut Interp) {
    interp.register_typed_primitive(
        "re-string-match",
        Arity::Exactly(2),
        re_string_match_impl,
        vec![TypeMask::STRING, TypeMask::STRING],
    );
}

/// Matches a pattern against a string. Returns `#f` on no match, otherwise
/// the list of captured strings (the whole match first; unmatched groups
/// capture as empty strings).
fn re_string_match_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let pattern = string_arg(interp, args, 0);
    let subject = string_arg(interp, args, 1);

    let re = Regex::new(&pattern)
        .map_err(|error| EvalError::from_primitive(format!("invalid regular expression: {error}"), env))?;

    let Some(captures) = re.captures(&subject) else {
        return Ok(Value::Boolean(false));
    };
    let mut items = Vec::with_capacity(captures.len());
    for group in captures.iter() {
        let text = group.map_or("", |m| m.as_str());
        items.push(interp.string(text));
    }
    Ok(list::array_to_list(&mut interp.heap, &items))
}

fn string_arg(interp: &Interp, args: Value, index: i64) -> String {
    match list::nth(&interp.heap, args, index) {
        Value::Ref(id) => match interp.heap.get(id) {
            HeapData::Str(s) => s.clone(),
            _ => unreachable!("argument types checked by registration"),
        },
        _ => unreachable!("argument types checked by registration"),
    }
}
