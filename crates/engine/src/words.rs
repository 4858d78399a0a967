//! Amount-in-words rendering.
//!
//! Reconciled totals are printed on custody receipts with their Spanish
//! spelling (`UN MILLON DE PESOS M/CTE`). The rendering is regenerated by the
//! reconciliation engine every time the numeric totals change; it is never
//! accepted from callers.

use crate::{Currency, Money};

const UNITS: [&str; 10] = [
    "", "UNO", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE",
];

const TEENS: [&str; 10] = [
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISEIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
];

const TENS: [&str; 10] = [
    "", "", "VEINTE", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA",
    "NOVENTA",
];

const HUNDREDS: [&str; 10] = [
    "",
    "CIENTO",
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

const MILLION: u64 = 1_000_000;
const TRILLION: u64 = 1_000_000_000_000;

/// `apocope` shortens a trailing "UNO" to "UN", as required before a noun or a
/// scale word ("VEINTIUN MIL", "UN PESO").
fn unit(n: u64, apocope: bool) -> &'static str {
    if n == 1 && apocope {
        "UN"
    } else {
        UNITS[n as usize]
    }
}

fn below_hundred(n: u64, apocope: bool) -> String {
    match n {
        0 => String::new(),
        1..=9 => unit(n, apocope).to_string(),
        10..=19 => TEENS[(n - 10) as usize].to_string(),
        20 => TENS[2].to_string(),
        21..=29 => format!("VEINTI{}", unit(n - 20, apocope)),
        _ => {
            let (tens, units) = (n / 10, n % 10);
            if units == 0 {
                TENS[tens as usize].to_string()
            } else {
                format!("{} Y {}", TENS[tens as usize], unit(units, apocope))
            }
        }
    }
}

fn below_thousand(n: u64, apocope: bool) -> String {
    if n == 100 {
        return "CIEN".to_string();
    }
    let (hundreds, rest) = (n / 100, n % 100);
    join(&[HUNDREDS[hundreds as usize].to_string(), below_hundred(rest, apocope)])
}

fn below_million(n: u64, apocope: bool) -> String {
    let (thousands, rest) = (n / 1000, n % 1000);
    let head = match thousands {
        0 => String::new(),
        1 => "MIL".to_string(),
        _ => format!("{} MIL", below_thousand(thousands, true)),
    };
    join(&[head, below_thousand(rest, apocope)])
}

fn scaled(n: u64, singular: &str, plural: &str) -> String {
    match n {
        0 => String::new(),
        1 => format!("UN {singular}"),
        _ => format!("{} {plural}", below_million(n, true)),
    }
}

fn join(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spells a non-negative integer in Spanish.
///
/// With `apocope`, a trailing "UNO" is shortened ("VEINTIUN") so the result
/// can be followed by a noun.
pub fn number_in_words(n: u64, apocope: bool) -> String {
    if n == 0 {
        return "CERO".to_string();
    }
    let trillions = n / TRILLION;
    let millions = (n / MILLION) % MILLION;
    let rest = n % MILLION;
    join(&[
        scaled(trillions, "BILLON", "BILLONES"),
        scaled(millions, "MILLON", "MILLONES"),
        below_million(rest, apocope),
    ])
}

/// Spells a monetary amount (`UN MILLON DE PESOS M/CTE`,
/// `DOS MIL QUINIENTOS PESOS CON 50/100 M/CTE`).
pub fn amount_in_words(amount: Money, currency: Currency) -> String {
    let abs = amount.minor().unsigned_abs();
    let major = abs / 100;
    let minor = abs % 100;
    let (singular, plural) = currency.spoken_names();

    let mut out = String::new();
    if amount.is_negative() {
        out.push_str("MENOS ");
    }
    out.push_str(&number_in_words(major, true));
    out.push(' ');
    if major > 0 && major % MILLION == 0 {
        out.push_str("DE ");
    }
    out.push_str(if major == 1 { singular } else { plural });
    if minor > 0 {
        out.push_str(&format!(" CON {minor:02}/100"));
    }
    if currency == Currency::Cop {
        out.push_str(" M/CTE");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spells_small_numbers() {
        assert_eq!(number_in_words(0, false), "CERO");
        assert_eq!(number_in_words(1, false), "UNO");
        assert_eq!(number_in_words(15, false), "QUINCE");
        assert_eq!(number_in_words(21, false), "VEINTIUNO");
        assert_eq!(number_in_words(21, true), "VEINTIUN");
        assert_eq!(number_in_words(45, false), "CUARENTA Y CINCO");
        assert_eq!(number_in_words(100, false), "CIEN");
        assert_eq!(number_in_words(101, false), "CIENTO UNO");
        assert_eq!(number_in_words(999, false), "NOVECIENTOS NOVENTA Y NUEVE");
    }

    #[test]
    fn spells_scales() {
        assert_eq!(number_in_words(1_000, false), "MIL");
        assert_eq!(number_in_words(21_000, false), "VEINTIUN MIL");
        assert_eq!(number_in_words(100_000, false), "CIEN MIL");
        assert_eq!(number_in_words(1_000_000, false), "UN MILLON");
        assert_eq!(
            number_in_words(2_500_300, false),
            "DOS MILLONES QUINIENTOS MIL TRESCIENTOS"
        );
        assert_eq!(number_in_words(1_000_000_000_000, false), "UN BILLON");
    }

    #[test]
    fn spells_amounts() {
        assert_eq!(
            amount_in_words(Money::major(1_000_000), Currency::Cop),
            "UN MILLON DE PESOS M/CTE"
        );
        assert_eq!(amount_in_words(Money::major(1), Currency::Cop), "UN PESO M/CTE");
        assert_eq!(
            amount_in_words(Money::new(250_050), Currency::Cop),
            "DOS MIL QUINIENTOS PESOS CON 50/100 M/CTE"
        );
        assert_eq!(
            amount_in_words(Money::major(-5_000), Currency::Cop),
            "MENOS CINCO MIL PESOS M/CTE"
        );
        assert_eq!(amount_in_words(Money::ZERO, Currency::Usd), "CERO DOLARES");
        assert_eq!(
            amount_in_words(Money::major(21), Currency::Eur),
            "VEINTIUN EUROS"
        );
    }
}
