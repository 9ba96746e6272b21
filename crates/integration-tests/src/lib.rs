//! Integration tests for the Murmur gateway live under tests/.
