/// Asset or currency ticker, upper-cased once canonicalized (e.g. "ETH", "USD")
pub type Symbol = String;
