use super::dice::{Dice, DiceGroup, OutputMode};
use super::record::RollRecord;
use crate::grade::Grade;
use crate::math;

/// Markdown conventions: dropped rolls struck through, explosions marked
/// `!`, natural max/min bold, threshold overrides shown as `natural -> used`.
pub(crate) fn render_record(r: &RollRecord) -> String {
    let mut s = r.value.to_string();
    if r.exploded {
        s.push('!');
    }
    if r.is_natural_max() || r.is_natural_min() {
        s = format!("**{}**", s);
    }
    if let Some(o) = r.overridden {
        s = format!("{} -> {}", s, o);
    }
    if r.dropped {
        s = format!("~~{}~~", s);
    }
    s
}

pub(crate) fn render_part(d: &Dice, mode: OutputMode) -> String {
    let expr = d.spec.expression();
    let rolls = d
        .rolls
        .iter()
        .map(render_record)
        .collect::<Vec<_>>()
        .join(", ");

    let mut detail = if rolls.is_empty() {
        format!("= {}", d.total)
    } else {
        format!("({}) = {}", rolls, d.total)
    };
    if d.grade != Grade::Unknown {
        detail.push_str(&format!(" [{}]", d.grade));
    }
    if mode == OutputMode::Secret {
        detail = format!("||{}||", detail);
    }

    let mut out = if expr.is_empty() {
        detail
    } else {
        format!("{} {}", expr, detail)
    };

    // Descriptions may embed literal arithmetic; rewrite it before display.
    if !d.spec.description.is_empty() {
        let desc = math::do_pos_neg(&math::do_complex(&d.spec.description));
        out.push(' ');
        out.push_str(&desc);
    }
    out
}

pub(crate) fn render_group(g: &DiceGroup) -> String {
    let sep = match g.mode {
        OutputMode::Long => "\n",
        OutputMode::Short | OutputMode::Secret => "; ",
    };

    let mut rendered = Vec::new();
    for d in &g.parts {
        rendered.push(render_part(d, g.mode));
        // Chained-test short circuit: later parts are computed but a failed
        // tested part ends the display.
        if d.spec.test.is_some() && d.grade.is_failure() {
            break;
        }
    }
    rendered.join(sep)
}
