//! Shared test fixtures and utilities for all test types
//!
//! Builds a small but realistic dataset with three components (hardware,
//! browser, crawler) using the public writer, so every test exercises the
//! same file format the loader reads in production.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use device_pattern::{DataSet, DataSetLoader, DataSetWriter};

pub const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Version/17.0 Mobile Safari/604.1";
pub const DESKTOP_CHROME_120: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0 Safari/537.36";
pub const DESKTOP_CHROME_100: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/100.0 Safari/537.36";
pub const GOOGLEBOT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

pub const HARDWARE_PROPERTIES: [&str; 2] = ["IsMobile", "HardwareVendor"];
pub const BROWSER_PROPERTIES: [&str; 3] = ["BrowserName", "BrowserVersion", "SupportedImages"];

/// Byte offset of `token` in `user_agent`
fn at(user_agent: &str, token: &str) -> usize {
    user_agent
        .find(token)
        .unwrap_or_else(|| panic!("{:?} not found in {:?}", token, user_agent))
}

/// Build the fixture dataset file.
///
/// Profiles:
/// - hardware: 1001 iPhone, 1002 desktop, 1003 crawler host
/// - browser: 2001 Safari 17, 2002 Chrome 120, 2003 Chrome 100, 2004 Googlebot
/// - crawler: 3001 not a crawler (component default), 3002 crawler
pub fn build_dataset_bytes(compress: bool) -> Vec<u8> {
    let mut writer = DataSetWriter::new().with_compression(compress);

    let hardware = writer.add_component("HardwarePlatform");
    let browser = writer.add_component("BrowserUA");
    let crawler = writer.add_component("Crawler");

    let is_mobile = writer.add_property("IsMobile", hardware).unwrap();
    let vendor = writer.add_property("HardwareVendor", hardware).unwrap();
    let browser_name = writer.add_property("BrowserName", browser).unwrap();
    let browser_version = writer.add_property("BrowserVersion", browser).unwrap();
    let images = writer.add_property("SupportedImages", browser).unwrap();
    let is_crawler = writer.add_property("IsCrawler", crawler).unwrap();

    let mobile_true = writer.add_value(is_mobile, "True").unwrap();
    let mobile_false = writer.add_value(is_mobile, "False").unwrap();
    let apple = writer.add_value(vendor, "Apple").unwrap();
    let unknown_vendor = writer.add_value(vendor, "Unknown").unwrap();
    let google = writer.add_value(vendor, "Google").unwrap();
    let safari = writer.add_value(browser_name, "Safari").unwrap();
    let chrome = writer.add_value(browser_name, "Chrome").unwrap();
    let googlebot = writer.add_value(browser_name, "Googlebot").unwrap();
    let v17 = writer.add_value(browser_version, "17.0").unwrap();
    let v120 = writer.add_value(browser_version, "120").unwrap();
    let v100 = writer.add_value(browser_version, "100").unwrap();
    writer.add_default_value(browser_version, "Unknown").unwrap();
    let jpg = writer.add_value(images, "jpg").unwrap();
    let png = writer.add_value(images, "png").unwrap();
    let webp = writer.add_value(images, "webp").unwrap();
    let avif = writer.add_value(images, "avif").unwrap();
    let crawler_true = writer.add_value(is_crawler, "True").unwrap();
    let crawler_false = writer.add_value(is_crawler, "False").unwrap();

    let iphone = writer.add_profile(1001, hardware, &[mobile_true, apple]).unwrap();
    let desktop = writer
        .add_profile(1002, hardware, &[mobile_false, unknown_vendor])
        .unwrap();
    let bot_host = writer.add_profile(1003, hardware, &[mobile_false, google]).unwrap();

    let safari_17 = writer
        .add_profile(2001, browser, &[safari, v17, jpg, png, webp])
        .unwrap();
    let chrome_120 = writer
        .add_profile(2002, browser, &[chrome, v120, webp, avif, jpg, png])
        .unwrap();
    let chrome_100 = writer
        .add_profile(2003, browser, &[chrome, v100, jpg, png, webp])
        .unwrap();
    let googlebot_21 = writer.add_profile(2004, browser, &[googlebot, jpg]).unwrap();

    let not_crawler = writer.add_profile(3001, crawler, &[crawler_false]).unwrap();
    let is_bot = writer.add_profile(3002, crawler, &[crawler_true]).unwrap();
    writer.set_default_profile(crawler, not_crawler).unwrap();

    // iPhone Safari
    let ua = IPHONE_SAFARI;
    let hw = writer
        .add_path(hardware, &[(at(ua, "iPhone"), "iPhone")])
        .unwrap();
    let version = at(ua, "Version/");
    let br = writer
        .add_path(
            browser,
            &[
                (version, "Version/"),
                (version + 8, "17"),
                (at(ua, "Safari/"), "Safari/"),
            ],
        )
        .unwrap();
    writer
        .add_signature(&[hw, br].concat(), &[iphone, safari_17, not_crawler])
        .unwrap();

    // Desktop Chrome, two versions sharing the platform and product nodes
    for (ua, version_token, profile) in [
        (DESKTOP_CHROME_120, "120", chrome_120),
        (DESKTOP_CHROME_100, "100", chrome_100),
    ] {
        let hw = writer
            .add_path(hardware, &[(at(ua, "Windows NT"), "Windows NT")])
            .unwrap();
        let product = at(ua, "Chrome/");
        let br = writer
            .add_path(
                browser,
                &[(product, "Chrome/"), (product + 7, version_token)],
            )
            .unwrap();
        writer
            .add_signature(&[hw, br].concat(), &[desktop, profile, not_crawler])
            .unwrap();
    }

    // Googlebot: the crawler token sits between hardware and browser nodes
    let ua = GOOGLEBOT;
    let hw = writer
        .add_root_node(hardware, at(ua, "compatible"), "compatible")
        .unwrap();
    let bot = writer
        .add_root_node(crawler, at(ua, "Googlebot/"), "Googlebot/")
        .unwrap();
    let br = writer.add_root_node(browser, at(ua, "2.1"), "2.1").unwrap();
    writer
        .add_signature(&[hw, bot, br], &[bot_host, googlebot_21, is_bot])
        .unwrap();

    writer.finalize().unwrap()
}

/// Load the fixture with the given required properties (empty = all)
pub fn load_fixture(required: &[&str]) -> DataSet {
    DataSetLoader::new()
        .with_required_properties(required.iter().copied())
        .load_from_bytes(&build_dataset_bytes(false))
        .expect("fixture dataset must load")
}

/// Write the fixture to a temporary directory and return its path
pub fn write_fixture_file(dir: &TempDir, compress: bool) -> PathBuf {
    let path = dir.path().join("devices.dpd");
    std::fs::write(&path, build_dataset_bytes(compress)).expect("write fixture");
    path
}

/// Flip one byte of a dataset file in place
pub fn corrupt_byte(data: &mut [u8], offset: usize) {
    data[offset] ^= 0x5a;
}
