/// Currency helpers for checkout.
///
/// Gig prices are stored in USD. Buyers are charged in their local currency
/// when the gateway supports it, otherwise in USD.

/// Maps an ISO-3166 country name or alpha-2 code to its ISO-4217 currency.
pub fn currency_for_country(country: &str) -> &'static str {
    match country.trim().to_ascii_lowercase().as_str() {
        "ng" | "nigeria" => "NGN",
        "gh" | "ghana" => "GHS",
        "ke" | "kenya" => "KES",
        "za" | "south africa" => "ZAR",
        "ug" | "uganda" => "UGX",
        "tz" | "tanzania" => "TZS",
        "rw" | "rwanda" => "RWF",
        "zm" | "zambia" => "ZMW",
        "eg" | "egypt" => "EGP",
        "cm" | "cameroon" => "XAF",
        "ci" | "cote d'ivoire" | "sn" | "senegal" => "XOF",
        "gb" | "uk" | "united kingdom" => "GBP",
        "de" | "germany" | "fr" | "france" | "es" | "spain" | "it" | "italy" | "nl"
        | "netherlands" | "ie" | "ireland" => "EUR",
        "ca" | "canada" => "CAD",
        _ => "USD",
    }
}

pub const PAYSTACK_CURRENCIES: &[&str] = &["NGN", "GHS", "ZAR", "KES", "USD"];

pub const FLUTTERWAVE_CURRENCIES: &[&str] = &[
    "NGN", "GHS", "KES", "ZAR", "UGX", "TZS", "RWF", "ZMW", "EGP", "XAF", "XOF", "GBP", "EUR", "CAD",
    "USD",
];

/// Picks the charge currency: the buyer's local currency if the gateway takes it, else USD.
pub fn charge_currency(country: Option<&str>, supported: &[&str]) -> &'static str {
    let local = country.map(currency_for_country).unwrap_or("USD");
    if supported.contains(&local) {
        local
    } else {
        "USD"
    }
}

/// Converts a USD amount at `rate` and rounds to two decimals.
pub fn convert_usd(amount_usd: f64, rate: f64) -> f64 {
    round_money(amount_usd * rate)
}

pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Share of each sale kept by the platform.
pub const PLATFORM_FEE_RATE: f64 = 0.10;

/// `(platform_fee, seller_net)` for a gross amount, both rounded to cents.
pub fn split_platform_fee(gross: f64) -> (f64, f64) {
    let fee = round_money(gross * PLATFORM_FEE_RATE);
    (fee, round_money(gross - fee))
}

/// Paystack expects the smallest currency unit (kobo, pesewas, cents).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_for_country() {
        assert_eq!(currency_for_country("Nigeria"), "NGN");
        assert_eq!(currency_for_country("NG"), "NGN");
        assert_eq!(currency_for_country(" ghana "), "GHS");
        assert_eq!(currency_for_country("Atlantis"), "USD");
    }

    #[test]
    fn test_charge_currency_falls_back_to_usd() {
        assert_eq!(charge_currency(Some("Kenya"), PAYSTACK_CURRENCIES), "KES");
        assert_eq!(charge_currency(Some("Uganda"), PAYSTACK_CURRENCIES), "USD");
        assert_eq!(charge_currency(Some("Uganda"), FLUTTERWAVE_CURRENCIES), "UGX");
        assert_eq!(charge_currency(None, FLUTTERWAVE_CURRENCIES), "USD");
    }

    #[test]
    fn test_platform_fee_split() {
        assert_eq!(split_platform_fee(250.0), (25.0, 225.0));
        assert_eq!(split_platform_fee(0.0), (0.0, 0.0));
        let (fee, net) = split_platform_fee(33.33);
        assert_eq!(fee, 3.33);
        assert_eq!(net, 30.0);
    }

    #[test]
    fn test_conversion_and_minor_units() {
        assert_eq!(convert_usd(10.0, 1500.5), 15005.0);
        assert_eq!(convert_usd(19.99, 1.0), 19.99);
        assert_eq!(to_minor_units(123.45), 12345);
        assert_eq!(round_money(0.125), 0.13);
    }
}
