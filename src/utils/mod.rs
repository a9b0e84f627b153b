use git_version::git_version;

pub fn version() -> String {
    format!(
        "{} ({})",
        env!("CARGO_PKG_VERSION"),
        git_version!(fallback = "unknown commit"),
    )
}

/// Formats a float the way C's `%g` does: six significant digits, trailing zeros removed, and
/// scientific notation for very small or very large values.
pub fn format_g(value: f64) -> String {
    if value == 0. {
        return String::from("0");
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // Round to six significant digits first, the exponent must be the one after rounding.
    let scientific = format!("{value:.5e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return scientific;
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        let mantissa = trim_fraction(mantissa);
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let precision = (5 - exp) as usize;
    trim_fraction(&format!("{value:.precision$}")).to_owned()
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
