mod test_malformed_frame_ignored;
