mod test_sources;
