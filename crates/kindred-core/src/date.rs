//! Free-text genealogical date parsing into the target store's fixed
//! encoding.
//!
//! [`encode`] is total: anything it cannot recognise becomes a verbatim-text
//! token rather than an error. The encoded layout is
//! `<type><dir><sign><year:4><month:2><day:2><doubleflag><qual>+00000000..`
//! where `<type>` is `D` (Gregorian), `Q` (Quaker), `R` (a year range, two
//! year-only halves joined, no qualifier support) or `T<text>` for the
//! fallback. Empty or absent input encodes to the sentinel `"."`.

/// Sentinel for an empty or absent date.
pub const EMPTY: &str = ".";

/// Certainty qualifiers; spliced into offset 12 of the encoded remainder.
/// Checked in order, so `calc` wins over its prefix `ca`.
const QUALIFIERS: &[(&str, char)] = &[
  ("abt", 'A'),
  ("about", 'A'),
  ("est", 'E'),
  ("calc", 'L'),
  ("ca", 'C'),
  ("say", 'S'),
];

/// Directional modifiers; spliced into offset 1.
const DIRECTIONALS: &[(&str, char)] = &[
  ("bef.", 'B'),
  ("bef", 'B'),
  ("before", 'B'),
  ("by", 'Y'),
  ("to", 'T'),
  ("until", 'U'),
  ("from", 'F'),
  ("since", 'I'),
  ("aft", 'A'),
  ("after", 'A'),
];

/// Confidence modifiers; spliced into offset 12, like qualifiers.
const CONFIDENCE: &[(&str, char)] = &[
  ("cert", '6'),
  ("prob", '5'),
  ("poss", '4'),
  ("lkly", '3'),
  ("appar", '2'),
  ("prhps", '1'),
  ("maybe", '?'),
];

/// Encode a raw date string. Deterministic and total.
pub fn encode(text: Option<&str>) -> String {
  match text {
    None => EMPTY.to_owned(),
    Some(raw) => {
      let lowered = raw.trim().to_lowercase();
      if lowered.is_empty() {
        EMPTY.to_owned()
      } else {
        encode_inner(&lowered)
      }
    }
  }
}

fn encode_inner(text: &str) -> String {
  // ISO dates short-circuit everything else.
  if let Some(code) = parse_iso(text) {
    return code;
  }

  // Strip at most one modifier of each class, recursively; each splices its
  // single-character code into a fixed offset of the encoded remainder.
  for &(word, mark) in QUALIFIERS {
    if let Some(rest) = strip_modifier(text, word) {
      return splice(&encode_inner(rest), 12, mark);
    }
  }
  for &(word, mark) in DIRECTIONALS {
    if let Some(rest) = strip_modifier(text, word) {
      return splice(&encode_inner(rest), 1, mark);
    }
  }
  for &(word, mark) in CONFIDENCE {
    if let Some(rest) = strip_modifier(text, word) {
      return splice(&encode_inner(rest), 12, mark);
    }
  }

  let tokens: Vec<&str> = text.split_whitespace().collect();

  parse_full_date(&tokens)
    .or_else(|| parse_month_year(&tokens))
    .or_else(|| parse_year_only(&tokens))
    .or_else(|| parse_day_month(&tokens))
    .or_else(|| parse_month_only(&tokens))
    .or_else(|| parse_double_date(&tokens))
    .or_else(|| parse_quaker(&tokens))
    .or_else(|| parse_year_range(&tokens))
    .unwrap_or_else(|| format!("T{text}"))
}

// ─── Component helpers ───────────────────────────────────────────────────────

fn format_date(
  year: Option<&str>,
  month: Option<&str>,
  day: Option<&str>,
  bc: bool,
  double: bool,
  quaker: bool,
) -> String {
  let year = year.map_or_else(|| "0000".to_owned(), |y| zfill(y, 4));
  let month = month.map_or_else(|| "00".to_owned(), |m| zfill(m, 2));
  let day = day.map_or_else(|| "00".to_owned(), |d| zfill(d, 2));

  let date_type = if quaker { 'Q' } else { 'D' };
  let sign = if bc { '-' } else { '+' };
  let double_flag = if double { '/' } else { '.' };

  format!("{date_type}.{sign}{year}{month}{day}{double_flag}.+00000000..")
}

/// Left-pad with zeros after an optional sign, like Python's `str.zfill`.
fn zfill(s: &str, width: usize) -> String {
  if s.len() >= width {
    return s.to_owned();
  }
  let (sign, digits) = match s.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", s),
  };
  format!("{sign}{}{digits}", "0".repeat(width - s.len()))
}

/// Replace the character at `idx`, appending when the code is shorter (text
/// fallbacks can be).
fn splice(code: &str, idx: usize, mark: char) -> String {
  let mut chars: Vec<char> = code.chars().collect();
  if idx < chars.len() {
    chars[idx] = mark;
  } else {
    chars.push(mark);
  }
  chars.into_iter().collect()
}

/// Strip a leading modifier word. The word must be followed by at least one
/// non-word character, which is consumed along with any run of them.
fn strip_modifier<'a>(text: &'a str, word: &str) -> Option<&'a str> {
  let rest = text.strip_prefix(word)?;
  let first = rest.chars().next()?;
  if first.is_ascii_alphanumeric() || first == '_' {
    return None;
  }
  Some(rest.trim_start_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '_')))
}

fn month_number(word: &str) -> Option<&'static str> {
  Some(match word {
    "jan" | "january" => "01",
    "feb" | "february" => "02",
    "mar" | "march" => "03",
    "apr" | "april" => "04",
    "may" => "05",
    "jun" | "june" => "06",
    "jul" | "july" => "07",
    "aug" | "august" => "08",
    "sep" | "september" => "09",
    "oct" | "october" => "10",
    "nov" | "november" => "11",
    "dec" | "december" => "12",
    _ => None?,
  })
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
  s.len() >= min && s.len() <= max && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_month_word(s: &str) -> bool {
  s.len() >= 3 && s.len() <= 9 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// A year component: 1-4 digits, optional leading minus.
fn is_year(s: &str) -> bool {
  let digits = s.strip_prefix('-').unwrap_or(s);
  is_digits(digits, 1, 4)
}

// ─── Grammar rules, in priority order ────────────────────────────────────────

fn parse_iso(text: &str) -> Option<String> {
  let b = text.as_bytes();
  if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
    return None;
  }
  if !(is_digits(&text[..4], 4, 4)
    && is_digits(&text[5..7], 2, 2)
    && is_digits(&text[8..], 2, 2))
  {
    return None;
  }
  Some(format_date(
    Some(&text[..4]),
    Some(&text[5..7]),
    Some(&text[8..]),
    false,
    false,
    false,
  ))
}

/// `D Mon YYYY [bc]`. An unrecognised month word in this position encodes as
/// `00`, matching the other anchored forms.
fn parse_full_date(tokens: &[&str]) -> Option<String> {
  let (bc, tokens) = split_bc(tokens);
  match tokens {
    [day, month, year]
      if is_digits(day, 1, 2) && is_month_word(month) && is_year(year) =>
    {
      let month = month_number(month).unwrap_or("00");
      Some(format_date(Some(year), Some(month), Some(day), bc, false, false))
    }
    _ => None,
  }
}

fn parse_month_year(tokens: &[&str]) -> Option<String> {
  let (bc, tokens) = split_bc(tokens);
  match tokens {
    [month, year] if is_month_word(month) && is_year(year) => {
      let month = month_number(month).unwrap_or("00");
      Some(format_date(Some(year), Some(month), None, bc, false, false))
    }
    _ => None,
  }
}

fn parse_year_only(tokens: &[&str]) -> Option<String> {
  let (bc, tokens) = split_bc(tokens);
  match tokens {
    [year] if is_year(year) => {
      Some(format_date(Some(year), None, None, bc, false, false))
    }
    _ => None,
  }
}

fn parse_day_month(tokens: &[&str]) -> Option<String> {
  match tokens {
    [day, month] if is_digits(day, 1, 2) && is_month_word(month) => {
      let month = month_number(month).unwrap_or("00");
      Some(format_date(None, Some(month), Some(day), false, false, false))
    }
    _ => None,
  }
}

/// A lone word is a month-only date just when it actually names a month;
/// unknown words fall through to the text fallback.
fn parse_month_only(tokens: &[&str]) -> Option<String> {
  match tokens {
    [month] => {
      let month = month_number(month)?;
      Some(format_date(None, Some(month), None, false, false, false))
    }
    _ => None,
  }
}

/// `D Mon YYYY/YY` — old-style/new-style double year.
fn parse_double_date(tokens: &[&str]) -> Option<String> {
  match tokens {
    [day, month, years] if is_digits(day, 1, 2) && is_month_word(month) => {
      let (year, alt) = years.split_once('/')?;
      if !(is_digits(year, 4, 4) && is_digits(alt, 2, 2)) {
        return None;
      }
      let month = month_number(month).unwrap_or("00");
      Some(format_date(Some(year), Some(month), Some(day), false, true, false))
    }
    _ => None,
  }
}

/// `Dda Mmo YYYY` — Quaker numbered months.
fn parse_quaker(tokens: &[&str]) -> Option<String> {
  match tokens {
    [day, month, year] if is_digits(year, 4, 4) => {
      let day = day.strip_suffix("da")?;
      let month = month.strip_suffix("mo")?;
      if !(is_digits(day, 1, 2) && is_digits(month, 1, 2)) {
        return None;
      }
      Some(format_date(Some(year), Some(month), Some(day), false, false, true))
    }
    _ => None,
  }
}

/// `between|bet Y1 [bc] and|- Y2 [bc]`, encoded as two joined year-only
/// halves with a BC sign per half.
fn parse_year_range(tokens: &[&str]) -> Option<String> {
  let (first, rest) = tokens.split_first()?;
  if !matches!(*first, "between" | "bet") {
    return None;
  }

  let (start, start_bc, rest) = take_year(rest)?;
  let (sep, rest) = rest.split_first()?;
  if !matches!(*sep, "and" | "-") {
    return None;
  }
  let (end, end_bc, rest) = take_year(rest)?;
  if !rest.is_empty() {
    return None;
  }

  let start_sign = if start_bc { '-' } else { '+' };
  let end_sign = if end_bc { '-' } else { '+' };
  Some(format!(
    "R.{start_sign}{}0000..{end_sign}{}0000..",
    zfill(start, 4),
    zfill(end, 4)
  ))
}

fn take_year<'a, 'b>(
  tokens: &'b [&'a str],
) -> Option<(&'a str, bool, &'b [&'a str])> {
  let (year, rest) = tokens.split_first()?;
  if !is_year(year) {
    return None;
  }
  match rest.split_first() {
    Some((&"bc", tail)) => Some((year, true, tail)),
    _ => Some((year, false, rest)),
  }
}

fn split_bc<'a, 'b>(tokens: &'b [&'a str]) -> (bool, &'b [&'a str]) {
  match tokens.split_last() {
    Some((&"bc", head)) => (true, head),
    _ => (false, tokens),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_and_absent_encode_to_sentinel() {
    assert_eq!(encode(None), ".");
    assert_eq!(encode(Some("")), ".");
    assert_eq!(encode(Some("   ")), ".");
  }

  #[test]
  fn full_date() {
    assert_eq!(encode(Some("12 Jan 1756")), "D.+17560112..+00000000..");
    assert_eq!(encode(Some("3 september 1901")), "D.+19010903..+00000000..");
  }

  #[test]
  fn iso_date() {
    assert_eq!(encode(Some("1756-01-12")), "D.+17560112..+00000000..");
  }

  #[test]
  fn year_only_and_month_year() {
    assert_eq!(encode(Some("1756")), "D.+17560000..+00000000..");
    assert_eq!(encode(Some("mar 1756")), "D.+17560300..+00000000..");
    assert_eq!(encode(Some("312")), "D.+03120000..+00000000..");
  }

  #[test]
  fn bc_year_sets_negative_sign() {
    assert_eq!(encode(Some("44 bc")), "D.-00440000..+00000000..");
    assert_eq!(encode(Some("15 mar 44 bc")), "D.-00440315..+00000000..");
  }

  #[test]
  fn day_month_and_month_only() {
    assert_eq!(encode(Some("12 jan")), "D.+00000112..+00000000..");
    assert_eq!(encode(Some("december")), "D.+00001200..+00000000..");
  }

  #[test]
  fn unknown_word_is_text_fallback_not_month() {
    assert_eq!(encode(Some("xyz")), "Txyz");
    assert_eq!(encode(Some("Unknown Date")), "Tunknown date");
  }

  #[test]
  fn double_date() {
    assert_eq!(encode(Some("12 feb 1732/33")), "D.+17320212/.+00000000..");
  }

  #[test]
  fn quaker_date() {
    assert_eq!(encode(Some("12da 3mo 1756")), "Q.+17560312..+00000000..");
  }

  #[test]
  fn year_range() {
    assert_eq!(encode(Some("between 1750 and 1760")), "R.+17500000..+17600000..");
    assert_eq!(encode(Some("bet 1750 - 1760")), "R.+17500000..+17600000..");
    assert_eq!(encode(Some("between 50 bc and 44 bc")), "R.-00500000..-00440000..");
  }

  #[test]
  fn certainty_qualifier_splices_offset_12() {
    assert_eq!(encode(Some("abt 1756")), "D.+17560000.A+00000000..");
    assert_eq!(encode(Some("ca 1756")), "D.+17560000.C+00000000..");
    assert_eq!(encode(Some("calc 1756")), "D.+17560000.L+00000000..");
    assert_eq!(encode(Some("say 1756")), "D.+17560000.S+00000000..");
  }

  #[test]
  fn directional_modifier_splices_offset_1() {
    assert_eq!(encode(Some("bef 1756")), "DB+17560000..+00000000..");
    assert_eq!(encode(Some("after 12 jan 1756")), "DA+17560112..+00000000..");
    assert_eq!(encode(Some("from 1756")), "DF+17560000..+00000000..");
  }

  #[test]
  fn confidence_modifier_splices_offset_12() {
    assert_eq!(encode(Some("prob 1756")), "D.+17560000.5+00000000..");
    assert_eq!(encode(Some("maybe 1756")), "D.+17560000.?+00000000..");
  }

  #[test]
  fn modifiers_stack_recursively() {
    assert_eq!(encode(Some("abt bef 1756")), "DB+17560000.A+00000000..");
  }

  #[test]
  fn modifier_requires_separator() {
    // "cab" must not be read as the qualifier "ca" plus junk; it parses as an
    // unrecognised month word ahead of a year.
    assert_eq!(encode(Some("cab 1900")), "D.+19000000..+00000000..");
  }

  #[test]
  fn modifier_on_unparseable_text_appends() {
    assert_eq!(encode(Some("abt weird")), "TweirdA");
  }

  #[test]
  fn encode_is_deterministic() {
    for input in ["12 Jan 1756", "abt 1750", "xyz", "between 1750 and 1760"] {
      let first = encode(Some(input));
      for _ in 0..10 {
        assert_eq!(encode(Some(input)), first);
      }
    }
  }
}
