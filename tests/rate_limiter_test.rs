use std::net::{IpAddr, Ipv4Addr};

use chat_relay::core::rate_limiter::RequestRateLimiter;

fn addr(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
}

#[tokio::test]
async fn test_requests_under_the_limit_are_admitted() {
    let limiter = RequestRateLimiter::new(3);

    assert!(limiter.check(addr(1)).await);
    assert!(limiter.check(addr(1)).await);
    assert!(limiter.check(addr(1)).await);
    assert!(!limiter.check(addr(1)).await);

    assert_eq!(limiter.request_count(addr(1)).await, 3);
}

#[tokio::test]
async fn test_throttling_one_address_does_not_affect_another() {
    let limiter = RequestRateLimiter::new(1);

    assert!(limiter.check(addr(2)).await);
    assert!(!limiter.check(addr(2)).await);

    assert!(limiter.check(addr(3)).await);
    assert_eq!(limiter.request_count(addr(3)).await, 1);
}

#[tokio::test]
async fn test_untracked_address_has_zero_count() {
    let limiter = RequestRateLimiter::new(10);
    assert_eq!(limiter.request_count(addr(4)).await, 0);
    assert_eq!(limiter.tracked_addresses().await, 0);
}
