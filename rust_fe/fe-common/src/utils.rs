// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Utility functions

/// Parse size string (e.g., "10GB", "512MB") to bytes
pub fn parse_size(size_str: &str) -> Result<u64, String> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, unit) = match size_str.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(pos) => (&size_str[..pos], size_str[pos..].trim()),
        None => (size_str.as_str(), ""),
    };

    let number: f64 = num_str
        .trim()
        .parse()
        .map_err(|e| format!("Invalid number: {}", e))?;

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        "TB" | "T" => 1024 * 1024 * 1024 * 1024,
        _ => return Err(format!("Unknown unit: {}", unit)),
    };

    Ok((number * multiplier as f64) as u64)
}

/// Format bytes to human readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2}{}", size, UNITS[unit_idx])
}

/// Ceiling of a / b for positive divisors
pub fn div_ceil(a: i64, b: i64) -> i64 {
    if b <= 0 {
        return a;
    }
    (a + b - 1) / b
}
