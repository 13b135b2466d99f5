mod parse_scenarios;
